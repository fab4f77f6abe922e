// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Eligibility record store.
//!
//! Records live for the lifetime of the process and are never deleted.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use super::{StorageError, StorageResult};
use crate::eligibility::{CredentialRef, EligibilityRecord, FinancialDeclaration};

/// Capability for reading and writing eligibility records.
pub trait EligibilityRecordStore: Send + Sync {
    /// Store a new record. Fails if the id is already taken.
    fn insert(&self, record: EligibilityRecord) -> StorageResult<EligibilityRecord>;

    /// Get a record by id.
    fn get(&self, id: &str) -> StorageResult<EligibilityRecord>;

    /// Attach a credential reference to a record.
    ///
    /// Compare-and-set: fails with [`StorageError::CredentialAlreadyAttached`]
    /// if the record already carries a credential, so two concurrent issuers
    /// cannot both succeed.
    fn attach_credential(&self, id: &str, credential: CredentialRef)
        -> StorageResult<EligibilityRecord>;

    /// Find the record that issued `credential_id`.
    fn find_by_credential(&self, credential_id: &str) -> StorageResult<EligibilityRecord>;

    /// All records, oldest first.
    fn list(&self) -> StorageResult<Vec<EligibilityRecord>>;

    /// Evaluate `declaration` now and store the resulting record.
    fn create(
        &self,
        declaration: &FinancialDeclaration,
        subject_did: &str,
        national_insurance_number: &str,
    ) -> StorageResult<EligibilityRecord> {
        self.insert(EligibilityRecord::evaluate(
            declaration,
            subject_did,
            national_insurance_number,
            Utc::now(),
        ))
    }
}

/// Process-scoped record store.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<String, EligibilityRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EligibilityRecordStore for InMemoryRecordStore {
    fn insert(&self, record: EligibilityRecord) -> StorageResult<EligibilityRecord> {
        let mut records = self.records.write()?;
        if records.contains_key(&record.id) {
            return Err(StorageError::AlreadyExists(format!(
                "Eligibility record {}",
                record.id
            )));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn get(&self, id: &str) -> StorageResult<EligibilityRecord> {
        self.records
            .read()?
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("Eligibility record {id}")))
    }

    fn attach_credential(
        &self,
        id: &str,
        credential: CredentialRef,
    ) -> StorageResult<EligibilityRecord> {
        let mut records = self.records.write()?;
        let record = records
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("Eligibility record {id}")))?;

        if record.credential.is_some() {
            return Err(StorageError::CredentialAlreadyAttached(id.to_string()));
        }

        record.credential = Some(credential);
        Ok(record.clone())
    }

    fn find_by_credential(&self, credential_id: &str) -> StorageResult<EligibilityRecord> {
        self.records
            .read()?
            .values()
            .find(|r| {
                r.credential
                    .as_ref()
                    .is_some_and(|c| c.id == credential_id)
            })
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("Credential {credential_id}")))
    }

    fn list(&self) -> StorageResult<Vec<EligibilityRecord>> {
        let mut records: Vec<_> = self.records.read()?.values().cloned().collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}
