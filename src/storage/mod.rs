// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Every store is a capability trait with an in-memory implementation that is
//! created once at startup and shared through the application state. Handlers
//! only ever see `Arc<dyn Trait>`, so tests (or a networked backend) can
//! substitute their own implementation.
//!
//! ## Stores
//!
//! | Store | Keyed by | Used by |
//! |-------|----------|---------|
//! | [`EligibilityRecordStore`] | record id | FEP eligibility endpoints |
//! | [`UserStore`] | user id / username | FEP auth and user endpoints |
//! | [`AuditLog`] | sequential id | FEP admin endpoints |
//! | [`ChallengeStore`] | challenge value | FEP DID endpoints |
//! | [`FormUserStore`] | email | form relay |
//! | [`BlobStore`] | object key | form relay |
//!
//! ## Concurrency
//!
//! Reads take a shared lock; writes take the exclusive lock for the whole
//! store. Record volume is low, so a store-wide writer lock is enough to make
//! `attach_credential` an atomic compare-and-set.

use std::sync::PoisonError;

pub mod audit;
pub mod blobs;
pub mod challenges;
pub mod forms;
pub mod records;
pub mod users;

pub use audit::{AuditEntry, AuditLog, AuditPage, AuditQuery, DEFAULT_AUDIT_LIMIT};
pub use blobs::{BlobStore, FsBlobStore, InMemoryBlobStore, StoredBlob};
pub use challenges::{Challenge, ChallengeRejection, ChallengeStore, CHALLENGE_TTL_SECS};
pub use forms::{FormUser, FormUserStore, InMemoryFormUserStore};
pub use records::{EligibilityRecordStore, InMemoryRecordStore};
pub use users::{InMemoryUserStore, Profile, StoredUser, UserStore};

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Record {0} already has a credential attached")]
    CredentialAlreadyAttached(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl<T> From<PoisonError<T>> for StorageError {
    fn from(_: PoisonError<T>) -> Self {
        StorageError::LockPoisoned
    }
}

/// Result type for store operations.
pub type StorageResult<T> = Result<T, StorageError>;
