// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Eligibility records and credential status.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::evaluator::{evaluate, FinancialDeclaration, FinancialSummary};

/// How long an eligibility result (and any credential issued from it) is valid.
pub const RECORD_VALIDITY_DAYS: i64 = 90;

/// Reference to the credential issued from a record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRef {
    pub id: String,
    pub issued_at: DateTime<Utc>,
}

/// Outcome of one eligibility check.
///
/// Immutable once created except for the single `credential` attachment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRecord {
    pub id: String,
    /// DID of the person the check was made for.
    pub subject_did: String,
    pub national_insurance_number: String,
    pub created_at: DateTime<Utc>,
    pub is_eligible: bool,
    pub score: u8,
    pub expires_at: DateTime<Utc>,
    pub financial_summary: FinancialSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<CredentialRef>,
}

impl EligibilityRecord {
    /// Evaluate `declaration` and build a fresh record stamped at `now`.
    pub fn evaluate(
        declaration: &FinancialDeclaration,
        subject_did: impl Into<String>,
        national_insurance_number: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let evaluation = evaluate(declaration);
        Self {
            id: Uuid::new_v4().to_string(),
            subject_did: subject_did.into(),
            national_insurance_number: national_insurance_number.into(),
            created_at: now,
            is_eligible: evaluation.is_eligible,
            score: evaluation.score,
            expires_at: now + Duration::days(RECORD_VALIDITY_DAYS),
            financial_summary: evaluation.summary,
            credential: None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether `did` names the subject of this record.
    pub fn is_subject(&self, did: Option<&str>) -> bool {
        did.is_some_and(|did| did == self.subject_did)
    }
}

/// Validity of an issued credential.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    Valid,
    Expired,
}

impl CredentialStatus {
    /// Status of the credential issued from `record`, judged at `now`.
    pub fn of(record: &EligibilityRecord, now: DateTime<Utc>) -> Self {
        if record.is_expired_at(now) {
            CredentialStatus::Expired
        } else {
            CredentialStatus::Valid
        }
    }
}
