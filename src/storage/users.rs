// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! FEP identity store.
//!
//! Maps user ids and usernames to accounts. Passwords are held as bcrypt
//! hashes only.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{StorageError, StorageResult};
use crate::auth::Role;

/// Free-form profile (first name, last name, email, ...).
pub type Profile = Map<String, Value>;

/// An account in the identity store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredUser {
    pub id: String,
    pub username: String,
    /// bcrypt hash; never serialized into responses
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    /// Linked decentralized identifier
    pub did: Option<String>,
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
}

/// Capability for the identity store.
pub trait UserStore: Send + Sync {
    /// Add an account. Fails if the id or username is taken.
    fn insert(&self, user: StoredUser) -> StorageResult<StoredUser>;

    fn get(&self, id: &str) -> StorageResult<StoredUser>;

    fn find_by_username(&self, username: &str) -> StorageResult<StoredUser>;

    /// All accounts in insertion order.
    fn list(&self) -> StorageResult<Vec<StoredUser>>;

    /// Shallow-merge `patch` into the stored profile.
    fn update_profile(&self, id: &str, patch: Profile) -> StorageResult<StoredUser>;

    /// Replace the linked DID.
    fn link_did(&self, id: &str, did: &str) -> StorageResult<StoredUser>;
}

/// Process-scoped identity store.
///
/// Kept as a `Vec` so listings come back in insertion order; the user count
/// stays small.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<StoredUser>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn modify<F>(&self, id: &str, f: F) -> StorageResult<StoredUser>
    where
        F: FnOnce(&mut StoredUser),
    {
        let mut users = self.users.write()?;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| StorageError::NotFound(format!("User {id}")))?;
        f(user);
        Ok(user.clone())
    }
}

impl UserStore for InMemoryUserStore {
    fn insert(&self, user: StoredUser) -> StorageResult<StoredUser> {
        let mut users = self.users.write()?;
        if users.iter().any(|u| u.username == user.username) {
            return Err(StorageError::AlreadyExists(format!(
                "Username {}",
                user.username
            )));
        }
        if users.iter().any(|u| u.id == user.id) {
            return Err(StorageError::AlreadyExists(format!("User {}", user.id)));
        }
        users.push(user.clone());
        Ok(user)
    }

    fn get(&self, id: &str) -> StorageResult<StoredUser> {
        self.users
            .read()?
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("User {id}")))
    }

    fn find_by_username(&self, username: &str) -> StorageResult<StoredUser> {
        self.users
            .read()?
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("Username {username}")))
    }

    fn list(&self) -> StorageResult<Vec<StoredUser>> {
        Ok(self.users.read()?.clone())
    }

    fn update_profile(&self, id: &str, patch: Profile) -> StorageResult<StoredUser> {
        self.modify(id, |user| user.profile.extend(patch))
    }

    fn link_did(&self, id: &str, did: &str) -> StorageResult<StoredUser> {
        self.modify(id, |user| user.did = Some(did.to_string()))
    }
}
