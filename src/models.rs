// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the FEP REST API. Field names are
//! camelCase on the wire. Required request fields are still `Option` so that
//! a missing value produces the endpoint's own `<domain>/missing-parameters`
//! error instead of a generic body rejection.
//!
//! ## Model Categories
//!
//! - **Auth**: login and token refresh
//! - **Users**: profiles, DID linking, admin user management
//! - **Eligibility**: checks, record views, credentials
//! - **DID**: challenge/response authentication

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::eligibility::{
    CredentialStatus, EligibilityRecord, FinancialDeclaration, FinancialSummary,
    VerifiableCredential,
};
use crate::storage::{Profile, StoredUser};

/// Treat absent and empty strings alike.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

// =============================================================================
// Auth Models
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Public view of an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl From<&StoredUser> for UserSummary {
    fn from(user: &StoredUser) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

// =============================================================================
// User Models
// =============================================================================

/// Full view of an account, as returned by `/users/me`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UserProfileResponse {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub did: Option<String>,
    #[schema(value_type = Object)]
    pub profile: Profile,
}

impl From<StoredUser> for UserProfileResponse {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            did: user.did,
            profile: user.profile,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    #[schema(value_type = Object)]
    pub profile: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LinkDidRequest {
    pub did: Option<String>,
    /// Proof of control over the DID. Presence is required; it is not verified.
    #[schema(value_type = Object)]
    pub proof: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LinkDidResponse {
    pub id: String,
    pub username: String,
    pub did: Option<String>,
}

/// Row in the admin user listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserListItem {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub did: Option<String>,
}

impl From<StoredUser> for UserListItem {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            did: user.did,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    /// One of `admin`, `user`, `adviser`, `citizen`; defaults to `user`.
    pub role: Option<String>,
    #[schema(value_type = Object)]
    pub profile: Option<Profile>,
}

// =============================================================================
// Eligibility Models
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityCheckRequest {
    pub did: Option<String>,
    pub national_insurance_number: Option<String>,
    #[serde(flatten)]
    pub declaration: FinancialDeclaration,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityCheckResponse {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub is_eligible: bool,
    pub score: u8,
    pub expires_at: DateTime<Utc>,
}

impl From<&EligibilityRecord> for EligibilityCheckResponse {
    fn from(record: &EligibilityRecord) -> Self {
        Self {
            id: record.id.clone(),
            timestamp: record.created_at,
            is_eligible: record.is_eligible,
            score: record.score,
            expires_at: record.expires_at,
        }
    }
}

/// Record view; the financial summary is only shown to admins.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRecordView {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub is_eligible: bool,
    pub score: u8,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financial_summary: Option<FinancialSummary>,
}

impl EligibilityRecordView {
    pub fn new(record: EligibilityRecord, include_summary: bool) -> Self {
        Self {
            id: record.id,
            timestamp: record.created_at,
            is_eligible: record.is_eligible,
            score: record.score,
            expires_at: record.expires_at,
            financial_summary: include_summary.then_some(record.financial_summary),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredentialResponse {
    /// Credential id (bare UUID).
    pub id: String,
    pub issued_at: DateTime<Utc>,
    pub credential: VerifiableCredential,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatusResponse {
    pub id: String,
    pub status: CredentialStatus,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// DID Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChallengeResponse {
    pub challenge: String,
    pub expires: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifyDidRequest {
    pub did: Option<String>,
    pub challenge: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyDidResponse {
    pub verified: bool,
    pub did: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn check_request_flattens_declaration() {
        let request: EligibilityCheckRequest = serde_json::from_value(json!({
            "did": "did:web:user.example.com",
            "nationalInsuranceNumber": "QQ123456C",
            "income": {"annual": 10000},
            "assets": {"savings": 1000},
            "dependents": [],
            "benefitsClaimed": []
        }))
        .unwrap();

        assert_eq!(non_empty(&request.did), Some("did:web:user.example.com"));
        assert_eq!(request.declaration.total_income(), 10000.0);
        assert_eq!(request.declaration.total_assets(), 1000.0);
    }

    #[test]
    fn check_request_tolerates_missing_fields() {
        let request: EligibilityCheckRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.did.is_none());
        assert!(request.national_insurance_number.is_none());
        assert_eq!(request.declaration.dependent_count(), 0);
    }

    #[test]
    fn non_empty_filters_blank() {
        assert_eq!(non_empty(&Some(String::new())), None);
        assert_eq!(non_empty(&None), None);
        assert_eq!(non_empty(&Some("x".into())), Some("x"));
    }

    #[test]
    fn record_view_hides_summary_for_non_admins() {
        let declaration: FinancialDeclaration =
            serde_json::from_value(json!({"income": {"annual": 1}})).unwrap();
        let record = EligibilityRecord::evaluate(&declaration, "did:web:a", "N", Utc::now());

        let hidden = serde_json::to_value(EligibilityRecordView::new(record.clone(), false)).unwrap();
        assert!(hidden.get("financialSummary").is_none());
        assert!(hidden.get("timestamp").is_some());

        let shown = serde_json::to_value(EligibilityRecordView::new(record, true)).unwrap();
        assert_eq!(shown["financialSummary"]["income"], 1.0);
    }

    #[test]
    fn profile_response_keeps_null_did() {
        let user = StoredUser {
            id: "3".into(),
            username: "new".into(),
            password_hash: "hash".into(),
            role: Role::Citizen,
            did: None,
            profile: Profile::new(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(UserProfileResponse::from(user)).unwrap();
        assert_eq!(value["did"], serde_json::Value::Null);
        assert_eq!(value["role"], "citizen");
        assert!(value.get("password_hash").is_none());
    }
}
