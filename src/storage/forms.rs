// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Form relay account table.
//!
//! One row per email address holding the account and the last submitted
//! form. Stands in for a managed key-value table.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use super::{StorageError, StorageResult};

/// An account in the form relay table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormUser {
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Last saved or submitted form.
    pub form_data: Option<serde_json::Value>,
}

/// Capability for the email-keyed account table.
pub trait FormUserStore: Send + Sync {
    /// Create an account. Fails if the email is taken.
    fn create_user(&self, user: FormUser) -> StorageResult<()>;

    fn find_by_email(&self, email: &str) -> StorageResult<Option<FormUser>>;

    /// Overwrite the saved form for `email`.
    fn save_form_data(&self, email: &str, form_data: serde_json::Value) -> StorageResult<()>;

    /// Saved form, if any.
    fn form_data(&self, email: &str) -> StorageResult<Option<serde_json::Value>> {
        Ok(self.find_by_email(email)?.and_then(|u| u.form_data))
    }
}

#[derive(Default)]
pub struct InMemoryFormUserStore {
    users: RwLock<HashMap<String, FormUser>>,
}

impl InMemoryFormUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FormUserStore for InMemoryFormUserStore {
    fn create_user(&self, user: FormUser) -> StorageResult<()> {
        let mut users = self.users.write()?;
        if users.contains_key(&user.email) {
            return Err(StorageError::AlreadyExists(format!("User {}", user.email)));
        }
        users.insert(user.email.clone(), user);
        Ok(())
    }

    fn find_by_email(&self, email: &str) -> StorageResult<Option<FormUser>> {
        Ok(self.users.read()?.get(email).cloned())
    }

    fn save_form_data(&self, email: &str, form_data: serde_json::Value) -> StorageResult<()> {
        let mut users = self.users.write()?;
        let user = users
            .get_mut(email)
            .ok_or_else(|| StorageError::NotFound(format!("User {email}")))?;
        user.form_data = Some(form_data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(email: &str) -> FormUser {
        FormUser {
            email: email.to_string(),
            name: "Jo Bloggs".to_string(),
            password_hash: "hash".to_string(),
            form_data: None,
        }
    }

    #[test]
    fn create_and_find() {
        let store = InMemoryFormUserStore::new();
        store.create_user(user("jo@example.com")).unwrap();
        assert_eq!(
            store.find_by_email("jo@example.com").unwrap().unwrap().name,
            "Jo Bloggs"
        );
        assert!(store.find_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_rejected() {
        let store = InMemoryFormUserStore::new();
        store.create_user(user("jo@example.com")).unwrap();
        assert!(matches!(
            store.create_user(user("jo@example.com")),
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[test]
    fn form_data_round_trip() {
        let store = InMemoryFormUserStore::new();
        store.create_user(user("jo@example.com")).unwrap();
        assert!(store.form_data("jo@example.com").unwrap().is_none());

        store
            .save_form_data("jo@example.com", json!({"deceasedName": "A"}))
            .unwrap();
        store
            .save_form_data("jo@example.com", json!({"deceasedName": "B"}))
            .unwrap();
        assert_eq!(
            store.form_data("jo@example.com").unwrap(),
            Some(json!({"deceasedName": "B"}))
        );
    }

    #[test]
    fn save_for_unknown_user_fails() {
        let store = InMemoryFormUserStore::new();
        assert!(matches!(
            store.save_form_data("x@example.com", json!({})),
            Err(StorageError::NotFound(_))
        ));
    }
}
