// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit log for administrative and credential-affecting actions.
//!
//! Entries are appended in memory with sequential ids and queried newest
//! first by the admin endpoints.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::StorageResult;
use crate::auth::AuthenticatedUser;

/// Default page size for audit queries.
pub const DEFAULT_AUDIT_LIMIT: usize = 100;

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Sequential id, starting at 1.
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub username: Option<String>,
    /// Free-form action name, e.g. `issue-credential`.
    pub action: String,
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
    pub ip_address: Option<String>,
}

/// Filter and page for [`AuditLog::query`].
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub action: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// A page of audit entries.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditPage {
    /// Matching entries before paging.
    pub total: usize,
    pub entries: Vec<AuditEntry>,
}

#[derive(Default)]
pub struct AuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry for `user` and return it.
    pub fn record(
        &self,
        user: &AuthenticatedUser,
        action: impl Into<String>,
        details: serde_json::Value,
        ip_address: Option<String>,
    ) -> StorageResult<AuditEntry> {
        let mut entries = self.entries.write()?;
        let entry = AuditEntry {
            id: entries.len() as u64 + 1,
            timestamp: Utc::now(),
            user_id: user.user_id.clone(),
            username: user.username.clone(),
            action: action.into(),
            details,
            ip_address,
        };
        entries.push(entry.clone());
        Ok(entry)
    }

    /// Matching entries, newest first.
    pub fn query(&self, query: &AuditQuery) -> StorageResult<AuditPage> {
        let entries = self.entries.read()?;
        let mut matching: Vec<AuditEntry> = entries
            .iter()
            .filter(|e| query.action.as_deref().is_none_or(|a| e.action == a))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        let total = matching.len();
        let entries = matching
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT))
            .collect();

        Ok(AuditPage { total, entries })
    }

    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.entries.read()?.len())
    }
}

/// Record an audit entry, logging (not propagating) failures.
#[macro_export]
macro_rules! audit_log {
    ($audit:expr, $user:expr, $action:expr) => {
        $crate::audit_log!($audit, $user, $action, ::serde_json::json!({}))
    };
    ($audit:expr, $user:expr, $action:expr, $details:expr) => {{
        if let Err(e) = $audit.record($user, $action, $details, None) {
            ::tracing::warn!(error = %e, action = $action, "Failed to write audit entry");
        }
    }};
}
