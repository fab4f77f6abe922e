// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Eligibility checks and credential issuance.
//!
//! A check evaluates the submitted declaration and stores the outcome as an
//! [`EligibilityRecord`] valid for 90 days. The record's subject (matched by
//! DID) or an admin may then view it and have a credential issued from it,
//! once. Credential status is public.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::{
    audit_log,
    auth::{Auth, AuthError, AuthenticatedUser},
    eligibility::{CredentialError, CredentialStatus, EligibilityRecord},
    error::{ApiError, ApiJson},
    models::{
        non_empty, CredentialStatusResponse, EligibilityCheckRequest, EligibilityCheckResponse,
        EligibilityRecordView, IssueCredentialResponse,
    },
    state::AppState,
    storage::StorageError,
};

fn record_not_found() -> ApiError {
    ApiError::not_found("eligibility/not-found", "Eligibility record not found")
}

fn fetch_record(state: &AppState, record_id: &str) -> Result<EligibilityRecord, ApiError> {
    state.records.get(record_id).map_err(|e| match e {
        StorageError::NotFound(_) => record_not_found(),
        other => other.into(),
    })
}

/// Whether `user` may act on `record`: its subject or an admin.
fn may_access(state: &AppState, user: &AuthenticatedUser, record: &EligibilityRecord) -> bool {
    user.is_admin() || record.is_subject(state.caller_did(user).as_deref())
}

fn forbidden(message: &str) -> ApiError {
    ApiError::forbidden(AuthError::InsufficientPermissions.error_code(), message)
}

// ============================================================================
// Handlers
// ============================================================================

/// Evaluate a financial declaration and store the result.
///
/// Missing numeric fields count as zero and missing lists as empty.
#[utoipa::path(
    post,
    path = "/eligibility/check",
    tag = "Eligibility",
    request_body = EligibilityCheckRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Eligibility evaluated", body = EligibilityCheckResponse),
        (status = 400, description = "DID or National Insurance Number missing"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn check_eligibility(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiJson(request): ApiJson<EligibilityCheckRequest>,
) -> Result<(StatusCode, Json<EligibilityCheckResponse>), ApiError> {
    let (Some(did), Some(nino)) = (
        non_empty(&request.did),
        non_empty(&request.national_insurance_number),
    ) else {
        return Err(ApiError::bad_request(
            "eligibility/missing-parameters",
            "DID and National Insurance Number are required",
        ));
    };

    let record = state.records.create(&request.declaration, did, nino)?;

    tracing::info!(
        record_id = %record.id,
        is_eligible = record.is_eligible,
        score = record.score,
        "Eligibility checked"
    );
    audit_log!(
        state.audit,
        &user,
        "eligibility-check",
        json!({
            "recordId": record.id,
            "isEligible": record.is_eligible,
            "score": record.score,
        })
    );

    Ok((StatusCode::CREATED, Json(EligibilityCheckResponse::from(&record))))
}

/// Get an eligibility record.
///
/// The financial summary is only included for admins.
#[utoipa::path(
    get,
    path = "/eligibility/{record_id}",
    tag = "Eligibility",
    params(("record_id" = String, Path, description = "Eligibility record id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Eligibility record", body = EligibilityRecordView),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Neither the record's subject nor an admin"),
        (status = 404, description = "Record not found")
    )
)]
pub async fn get_record(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(record_id): Path<String>,
) -> Result<Json<EligibilityRecordView>, ApiError> {
    let record = fetch_record(&state, &record_id)?;

    if !may_access(&state, &user, &record) {
        return Err(forbidden("Not authorized to view this record"));
    }

    Ok(Json(EligibilityRecordView::new(record, user.is_admin())))
}

/// Issue a credential for an eligible record.
///
/// At most one credential is issued per record; later requests get 409.
#[utoipa::path(
    post,
    path = "/eligibility/{record_id}/issue-credential",
    tag = "Eligibility",
    params(("record_id" = String, Path, description = "Eligibility record id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Credential issued", body = IssueCredentialResponse),
        (status = 400, description = "Record is not eligible"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Neither the record's subject nor an admin"),
        (status = 404, description = "Record not found"),
        (status = 409, description = "A credential was already issued for this record")
    )
)]
pub async fn issue_credential(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(record_id): Path<String>,
) -> Result<Json<IssueCredentialResponse>, ApiError> {
    let record = fetch_record(&state, &record_id)?;

    if !record.is_eligible {
        return Err(ApiError::bad_request(
            "eligibility/not-eligible",
            "Cannot issue credential for ineligible record",
        ));
    }

    if !may_access(&state, &user, &record) {
        return Err(forbidden("Not authorized to issue credential for this record"));
    }

    let issued = state
        .credentials
        .issue(state.records.as_ref(), &record, Utc::now())
        .map_err(|e| match e {
            CredentialError::AlreadyIssued(_) => ApiError::conflict(
                "eligibility/credential-already-issued",
                "A credential has already been issued for this record",
            ),
            CredentialError::NotEligible => ApiError::bad_request(
                "eligibility/not-eligible",
                "Cannot issue credential for ineligible record",
            ),
            CredentialError::Storage(StorageError::NotFound(_)) => record_not_found(),
            other => ApiError::internal(other),
        })?;

    audit_log!(
        state.audit,
        &user,
        "issue-credential",
        json!({"recordId": record.id, "credentialId": issued.reference.id})
    );

    Ok(Json(IssueCredentialResponse {
        id: issued.reference.id,
        issued_at: issued.reference.issued_at,
        credential: issued.credential,
    }))
}

/// Get the status of an issued credential. No authentication required.
#[utoipa::path(
    get,
    path = "/eligibility/credentials/{credential_id}/status",
    tag = "Eligibility",
    params(("credential_id" = String, Path, description = "Credential id")),
    responses(
        (status = 200, description = "Credential status", body = CredentialStatusResponse),
        (status = 404, description = "Credential not found")
    )
)]
pub async fn credential_status(
    State(state): State<AppState>,
    Path(credential_id): Path<String>,
) -> Result<Json<CredentialStatusResponse>, ApiError> {
    let record = state
        .records
        .find_by_credential(&credential_id)
        .map_err(|e| match e {
            StorageError::NotFound(_) => {
                ApiError::not_found("credential/not-found", "Credential not found")
            }
            other => other.into(),
        })?;

    let Some(credential) = record.credential.clone() else {
        return Err(ApiError::not_found("credential/not-found", "Credential not found"));
    };

    Ok(Json(CredentialStatusResponse {
        id: credential_id,
        status: CredentialStatus::of(&record, Utc::now()),
        issued_at: credential.issued_at,
        expires_at: record.expires_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::eligibility::{CredentialRef, FinancialDeclaration};
    use crate::state::test_support::{admin, caller, seeded_state, user};
    use crate::storage::AuditQuery;
    use chrono::Duration;
    use serde_json::Value;

    fn check_request(value: Value) -> ApiJson<EligibilityCheckRequest> {
        ApiJson(serde_json::from_value(value).unwrap())
    }

    fn eligible_request() -> ApiJson<EligibilityCheckRequest> {
        check_request(json!({
            "did": "did:web:user.example.com",
            "nationalInsuranceNumber": "QQ123456C",
            "income": {"annual": 10000},
            "assets": {"savings": 1000},
            "dependents": [],
            "benefitsClaimed": []
        }))
    }

    async fn checked(state: &AppState, request: ApiJson<EligibilityCheckRequest>) -> String {
        let (_, Json(body)) = check_eligibility(State(state.clone()), Auth(user()), request)
            .await
            .unwrap();
        body.id
    }

    #[tokio::test]
    async fn check_scores_and_stores() {
        let state = seeded_state().await;
        let (status, Json(body)) =
            check_eligibility(State(state.clone()), Auth(user()), eligible_request())
                .await
                .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert!(body.is_eligible);
        assert_eq!(body.score, 60);
        assert_eq!(body.expires_at - body.timestamp, Duration::days(90));

        let stored = state.records.get(&body.id).unwrap();
        assert_eq!(stored.subject_did, "did:web:user.example.com");

        let audit = state
            .audit
            .query(&AuditQuery {
                action: Some("eligibility-check".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(audit.total, 1);
        assert_eq!(audit.entries[0].details["recordId"], body.id);
    }

    #[tokio::test]
    async fn check_requires_did_and_nino() {
        let state = seeded_state().await;
        for body in [
            json!({"nationalInsuranceNumber": "QQ123456C"}),
            json!({"did": "did:web:user.example.com"}),
            json!({"did": "", "nationalInsuranceNumber": "QQ123456C"}),
        ] {
            let err = check_eligibility(State(state.clone()), Auth(user()), check_request(body))
                .await
                .unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.code, "eligibility/missing-parameters");
        }
        assert!(state.records.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn owner_sees_record_without_summary() {
        let state = seeded_state().await;
        let id = checked(&state, eligible_request()).await;

        let Json(view) = get_record(State(state), Auth(user()), Path(id)).await.unwrap();
        assert!(view.financial_summary.is_none());
        assert_eq!(view.score, 60);
    }

    #[tokio::test]
    async fn admin_sees_summary() {
        let state = seeded_state().await;
        let id = checked(&state, eligible_request()).await;

        let Json(view) = get_record(State(state), Auth(admin()), Path(id)).await.unwrap();
        let summary = view.financial_summary.unwrap();
        assert_eq!(summary.income, 10000.0);
        assert_eq!(summary.assets, 1000.0);
    }

    #[tokio::test]
    async fn stranger_is_forbidden() {
        let state = seeded_state().await;
        let id = checked(&state, eligible_request()).await;
        let stranger = caller("77", Role::Citizen, Some("did:web:someone.else"));

        let err = get_record(State(state), Auth(stranger), Path(id)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.code, "auth/insufficient-permissions");
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let state = seeded_state().await;
        let err = get_record(State(state.clone()), Auth(admin()), Path("nope".into()))
            .await
            .unwrap_err();
        assert_eq!(err.code, "eligibility/not-found");

        let err = issue_credential(State(state), Auth(admin()), Path("nope".into()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn issue_then_check_status() {
        let state = seeded_state().await;
        let id = checked(&state, eligible_request()).await;

        let Json(issued) = issue_credential(State(state.clone()), Auth(user()), Path(id.clone()))
            .await
            .unwrap();
        assert_eq!(issued.credential.credential_subject.eligibility_score, 60);
        assert_eq!(
            issued.credential.id,
            format!("https://fep.gov.uk/credentials/{}", issued.id)
        );

        let Json(status) = credential_status(State(state.clone()), Path(issued.id.clone()))
            .await
            .unwrap();
        assert_eq!(status.status, CredentialStatus::Valid);
        assert_eq!(status.issued_at, issued.issued_at);

        let record = state.records.get(&id).unwrap();
        assert_eq!(status.expires_at, record.expires_at);
    }

    #[tokio::test]
    async fn second_issue_conflicts() {
        let state = seeded_state().await;
        let id = checked(&state, eligible_request()).await;

        issue_credential(State(state.clone()), Auth(user()), Path(id.clone()))
            .await
            .unwrap();
        let err = issue_credential(State(state), Auth(admin()), Path(id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "eligibility/credential-already-issued");
    }

    #[tokio::test]
    async fn ineligible_record_reports_not_eligible_before_permissions() {
        let state = seeded_state().await;
        let id = checked(
            &state,
            check_request(json!({
                "did": "did:web:user.example.com",
                "nationalInsuranceNumber": "QQ123456C",
                "income": {"annual": 50000},
                "assets": {"savings": 50000}
            })),
        )
        .await;
        let stranger = caller("77", Role::Citizen, None);

        let err = issue_credential(State(state), Auth(stranger), Path(id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "eligibility/not-eligible");
    }

    #[tokio::test]
    async fn stranger_cannot_issue() {
        let state = seeded_state().await;
        let id = checked(&state, eligible_request()).await;
        let stranger = caller("77", Role::Citizen, Some("did:web:someone.else"));

        let err = issue_credential(State(state), Auth(stranger), Path(id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn expired_credential_reports_expired() {
        let state = seeded_state().await;
        let declaration = FinancialDeclaration::default();
        let record = EligibilityRecord::evaluate(
            &declaration,
            "did:web:user.example.com",
            "QQ123456C",
            Utc::now() - Duration::days(91),
        );
        let record = state.records.insert(record).unwrap();
        state
            .records
            .attach_credential(
                &record.id,
                CredentialRef {
                    id: "old-cred".into(),
                    issued_at: record.created_at,
                },
            )
            .unwrap();

        let Json(status) = credential_status(State(state), Path("old-cred".into()))
            .await
            .unwrap();
        assert_eq!(status.status, CredentialStatus::Expired);
    }

    #[tokio::test]
    async fn unknown_credential_is_not_found() {
        let state = seeded_state().await;
        let err = credential_status(State(state), Path("missing".into()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "credential/not-found");
    }
}
