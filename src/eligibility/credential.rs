// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Financial eligibility credentials.
//!
//! A credential is derived entirely from an eligible [`EligibilityRecord`]
//! and issued at most once per record. Re-issuing is rejected with
//! [`CredentialError::AlreadyIssued`]; the record store's compare-and-set
//! attachment is what makes that hold under concurrent requests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::record::{CredentialRef, EligibilityRecord};
use super::signer::{ProofSigner, SigningError, PROOF_TYPE};
use crate::storage::{EligibilityRecordStore, StorageError};

pub const W3C_CREDENTIALS_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const FEP_CREDENTIALS_CONTEXT: &str = "https://www.gov.uk/schemas/fep/v1";
pub const CREDENTIAL_TYPE: &str = "FinancialEligibilityCredential";

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("record is not eligible")]
    NotEligible,
    #[error("a credential has already been issued for record {0}")]
    AlreadyIssued(String),
    #[error(transparent)]
    Signing(#[from] SigningError),
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for CredentialError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::CredentialAlreadyAttached(id) => CredentialError::AlreadyIssued(id),
            other => CredentialError::Storage(other),
        }
    }
}

/// Coarse banding of the eligibility score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EligibilityLevel {
    High,
    Medium,
    Low,
}

impl EligibilityLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            75.. => EligibilityLevel::High,
            50..=74 => EligibilityLevel::Medium,
            _ => EligibilityLevel::Low,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EligibilitySubject {
    /// Subject DID.
    pub id: String,
    pub eligibility_score: u8,
    pub eligibility_verified: bool,
    pub eligibility_level: EligibilityLevel,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialProof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub created: DateTime<Utc>,
    pub verification_method: String,
    pub proof_purpose: String,
    pub proof_value: String,
}

/// W3C-style verifiable credential asserting financial eligibility.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    #[serde(rename = "type")]
    pub credential_type: Vec<String>,
    pub issuer: String,
    pub issuance_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,
    pub credential_subject: EligibilitySubject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<CredentialProof>,
}

/// A freshly issued credential and the reference stored on its record.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub reference: CredentialRef,
    pub credential: VerifiableCredential,
}

/// Builds, signs and attaches credentials.
#[derive(Clone)]
pub struct CredentialIssuer {
    issuer_did: String,
    base_url: String,
    signer: Arc<dyn ProofSigner>,
}

impl CredentialIssuer {
    pub fn new(
        issuer_did: impl Into<String>,
        base_url: impl Into<String>,
        signer: Arc<dyn ProofSigner>,
    ) -> Self {
        Self {
            issuer_did: issuer_did.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signer,
        }
    }

    pub fn signer(&self) -> &dyn ProofSigner {
        self.signer.as_ref()
    }

    /// Build and sign a credential for `record` without storing anything.
    pub fn build(
        &self,
        record: &EligibilityRecord,
        now: DateTime<Utc>,
    ) -> Result<IssuedCredential, CredentialError> {
        if !record.is_eligible {
            return Err(CredentialError::NotEligible);
        }
        if record.credential.is_some() {
            return Err(CredentialError::AlreadyIssued(record.id.clone()));
        }

        let credential_id = Uuid::new_v4().to_string();
        let mut credential = VerifiableCredential {
            context: vec![
                W3C_CREDENTIALS_CONTEXT.to_string(),
                FEP_CREDENTIALS_CONTEXT.to_string(),
            ],
            id: format!("{}/{}", self.base_url, credential_id),
            credential_type: vec!["VerifiableCredential".to_string(), CREDENTIAL_TYPE.to_string()],
            issuer: self.issuer_did.clone(),
            issuance_date: now,
            expiration_date: record.expires_at,
            credential_subject: EligibilitySubject {
                id: record.subject_did.clone(),
                eligibility_score: record.score,
                eligibility_verified: true,
                eligibility_level: EligibilityLevel::from_score(record.score),
                valid_from: now,
                valid_until: record.expires_at,
            },
            proof: None,
        };

        // The proof covers the credential serialized without its proof block.
        let payload = serde_json::to_vec(&credential).map_err(StorageError::from)?;
        credential.proof = Some(CredentialProof {
            proof_type: PROOF_TYPE.to_string(),
            created: now,
            verification_method: self.signer.verification_method().to_string(),
            proof_purpose: "assertionMethod".to_string(),
            proof_value: self.signer.sign(&payload)?,
        });

        Ok(IssuedCredential {
            reference: CredentialRef {
                id: credential_id,
                issued_at: now,
            },
            credential,
        })
    }

    /// Issue a credential for `record` and attach it in `store`.
    ///
    /// Fails with `AlreadyIssued` if another request attached a credential
    /// between the read of `record` and this call.
    pub fn issue(
        &self,
        store: &dyn EligibilityRecordStore,
        record: &EligibilityRecord,
        now: DateTime<Utc>,
    ) -> Result<IssuedCredential, CredentialError> {
        let issued = self.build(record, now)?;
        store.attach_credential(&record.id, issued.reference.clone())?;

        tracing::info!(
            record_id = %record.id,
            credential_id = %issued.reference.id,
            "Credential issued"
        );
        Ok(issued)
    }
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("issuer_did", &self.issuer_did)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
