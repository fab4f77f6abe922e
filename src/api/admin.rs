// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin API endpoints for service management.
//!
//! Everything here requires the Admin role except `POST /admin/audit-log`,
//! which any authenticated caller may use to record client-side actions.
//! Provides:
//! - Service status
//! - Audit log queries
//! - Runtime configuration
//! - Eligibility and user activity reports

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use utoipa::{IntoParams, ToSchema};

use crate::{
    audit_log,
    auth::{AdminOnly, Auth},
    error::{ApiError, ApiJson, ApiQuery},
    models::non_empty,
    reports::{
        eligibility_report, user_activity_report, EligibilityReport, ReportPeriod,
        UserActivityReport,
    },
    state::AppState,
    storage::{AuditEntry, AuditQuery, DEFAULT_AUDIT_LIMIT},
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Service status response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub service: String,
    pub version: String,
    /// Seconds since the service started.
    pub uptime: u64,
    pub timestamp: DateTime<Utc>,
    pub environment: String,
    pub eligibility_records: usize,
    pub credentials_issued: usize,
    pub users: usize,
    pub audit_entries: usize,
}

/// Query parameters for audit log queries.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AuditLogParams {
    /// Maximum number of results (default 100).
    pub limit: Option<usize>,
    /// Offset for pagination.
    pub offset: Option<usize>,
    /// Only entries with this action.
    pub action: Option<String>,
}

/// A page of the audit log, newest first.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuditLogResponse {
    /// Matching entries before paging.
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub logs: Vec<AuditEntry>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAuditEntryRequest {
    pub action: Option<String>,
    #[schema(value_type = Object)]
    pub details: Option<Value>,
}

/// `value` may be any JSON value including `null`; only a missing field is
/// rejected.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateConfigRequest {
    pub key: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Object)]
    pub value: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateConfigResponse {
    pub key: String,
    #[schema(value_type = Object)]
    pub value: Value,
    pub updated: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ReportParams {
    /// First day of the report (YYYY-MM-DD), inclusive.
    pub start_date: Option<String>,
    /// Last day of the report (YYYY-MM-DD), inclusive.
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ReportData {
    Eligibility(EligibilityReport),
    Users(UserActivityReport),
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub report_type: String,
    pub generated_at: DateTime<Utc>,
    pub data: ReportData,
}

/// First address in `X-Forwarded-For`, if any.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Handlers
// ============================================================================

/// Get service status.
///
/// Returns uptime, environment and live store counts. Admin only.
#[utoipa::path(
    get,
    path = "/admin/status",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Service status", body = StatusResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn get_status(
    AdminOnly(_user): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let records = state.records.list()?;
    let credentials_issued = records.iter().filter(|r| r.credential.is_some()).count();

    Ok(Json(StatusResponse {
        service: state.service.name.clone(),
        version: state.service.version.clone(),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
        environment: state.service.environment.clone(),
        eligibility_records: records.len(),
        credentials_issued,
        users: state.users.list()?.len(),
        audit_entries: state.audit.len()?,
    }))
}

/// Query the audit log.
#[utoipa::path(
    get,
    path = "/admin/audit-log",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(AuditLogParams),
    responses(
        (status = 200, description = "Audit entries", body = AuditLogResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn get_audit_log(
    AdminOnly(_user): AdminOnly,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<AuditLogParams>,
) -> Result<Json<AuditLogResponse>, ApiError> {
    let offset = params.offset.unwrap_or(0);
    let limit = params.limit.unwrap_or(DEFAULT_AUDIT_LIMIT);

    let page = state.audit.query(&AuditQuery {
        action: params.action.filter(|a| !a.is_empty()),
        limit: Some(limit),
        offset: Some(offset),
    })?;

    Ok(Json(AuditLogResponse {
        total: page.total,
        offset,
        limit,
        logs: page.entries,
    }))
}

/// Record an audit entry for the caller.
///
/// Open to any authenticated user.
#[utoipa::path(
    post,
    path = "/admin/audit-log",
    tag = "Admin",
    security(("bearer_auth" = [])),
    request_body = CreateAuditEntryRequest,
    responses(
        (status = 201, description = "Entry recorded", body = AuditEntry),
        (status = 400, description = "Missing action"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_audit_entry(
    Auth(user): Auth,
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<CreateAuditEntryRequest>,
) -> Result<(StatusCode, Json<AuditEntry>), ApiError> {
    let Some(action) = non_empty(&request.action) else {
        return Err(ApiError::bad_request(
            "admin/missing-parameters",
            "Action is required",
        ));
    };

    let details = request.details.unwrap_or_else(|| json!({}));
    let entry = state
        .audit
        .record(&user, action, details, client_ip(&headers))?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Change a runtime setting.
#[utoipa::path(
    patch,
    path = "/admin/config",
    tag = "Admin",
    security(("bearer_auth" = [])),
    request_body = UpdateConfigRequest,
    responses(
        (status = 200, description = "Setting stored", body = UpdateConfigResponse),
        (status = 400, description = "Missing key or value"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn update_config(
    AdminOnly(user): AdminOnly,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateConfigRequest>,
) -> Result<Json<UpdateConfigResponse>, ApiError> {
    let (Some(key), Some(value)) = (non_empty(&request.key), request.value) else {
        return Err(ApiError::bad_request(
            "admin/missing-parameters",
            "Configuration key and value are required",
        ));
    };

    state
        .settings
        .write()
        .await
        .insert(key.to_string(), value.clone());

    tracing::info!(key, updated_by = %user.user_id, "Runtime setting updated");
    audit_log!(
        state.audit,
        &user,
        "update-config",
        json!({ "key": key, "value": value })
    );

    Ok(Json(UpdateConfigResponse {
        key: key.to_string(),
        value,
        updated: true,
        timestamp: Utc::now(),
    }))
}

/// Generate a report over a date range.
///
/// `report_type` is `eligibility` or `users`.
#[utoipa::path(
    get,
    path = "/admin/reports/{report_type}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(
        ("report_type" = String, Path, description = "eligibility or users"),
        ReportParams
    ),
    responses(
        (status = 200, description = "Report", body = ReportResponse),
        (status = 400, description = "Missing or invalid dates, or unknown report type"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn generate_report(
    AdminOnly(_user): AdminOnly,
    State(state): State<AppState>,
    Path(report_type): Path<String>,
    ApiQuery(params): ApiQuery<ReportParams>,
) -> Result<Json<ReportResponse>, ApiError> {
    let (Some(start), Some(end)) = (non_empty(&params.start_date), non_empty(&params.end_date))
    else {
        return Err(ApiError::bad_request(
            "admin/missing-parameters",
            "Start date and end date are required",
        ));
    };

    if !matches!(report_type.as_str(), "eligibility" | "users") {
        return Err(ApiError::bad_request(
            "admin/invalid-report-type",
            "Invalid report type",
        ));
    }

    let period = ReportPeriod::parse(start, end)
        .map_err(|e| ApiError::bad_request("admin/invalid-parameters", e.to_string()))?;

    let data = if report_type == "eligibility" {
        ReportData::Eligibility(eligibility_report(&state.records.list()?, period))
    } else {
        let users = state.users.list()?;
        let audit = state.audit.query(&AuditQuery {
            limit: Some(usize::MAX),
            ..Default::default()
        })?;
        ReportData::Users(user_activity_report(&users, &audit.entries, period))
    };

    Ok(Json(ReportResponse {
        report_type,
        generated_at: Utc::now(),
        data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::FinancialDeclaration;
    use crate::state::test_support::{admin, seeded_state, test_state, user};

    fn report_params(start: Option<&str>, end: Option<&str>) -> ApiQuery<ReportParams> {
        ApiQuery(ReportParams {
            start_date: start.map(str::to_string),
            end_date: end.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn status_reports_live_counts() {
        let state = seeded_state().await;
        state
            .records
            .create(&FinancialDeclaration::default(), "did:web:a", "N")
            .unwrap();

        let Json(status) = get_status(AdminOnly(admin()), State(state)).await.unwrap();
        assert_eq!(status.eligibility_records, 1);
        assert_eq!(status.credentials_issued, 0);
        assert_eq!(status.users, 2);
        assert_eq!(status.environment, "test");
    }

    #[tokio::test]
    async fn audit_entry_round_trip() {
        let state = test_state();
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());

        let (status, Json(entry)) = create_audit_entry(
            Auth(user()),
            State(state.clone()),
            headers,
            ApiJson(CreateAuditEntryRequest {
                action: Some("view-passport".into()),
                details: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(entry.id, 1);
        assert_eq!(entry.details, json!({}));
        assert_eq!(entry.ip_address.as_deref(), Some("203.0.113.7"));

        let Json(page) = get_audit_log(
            AdminOnly(admin()),
            State(state),
            ApiQuery(AuditLogParams {
                action: Some("view-passport".into()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.limit, DEFAULT_AUDIT_LIMIT);
        assert_eq!(page.logs[0].user_id, "2");
    }

    #[tokio::test]
    async fn audit_entry_requires_action() {
        let err = create_audit_entry(
            Auth(user()),
            State(test_state()),
            HeaderMap::new(),
            ApiJson(CreateAuditEntryRequest {
                action: None,
                details: Some(json!({"a": 1})),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "admin/missing-parameters");
    }

    #[tokio::test]
    async fn config_update_is_stored_and_audited() {
        let state = test_state();
        let request: UpdateConfigRequest =
            serde_json::from_value(json!({"key": "maintenance", "value": null})).unwrap();

        let Json(body) = update_config(AdminOnly(admin()), State(state.clone()), ApiJson(request))
            .await
            .unwrap();
        assert!(body.updated);
        assert_eq!(body.value, Value::Null);

        assert_eq!(
            state.settings.read().await.get("maintenance"),
            Some(&Value::Null)
        );
        let page = state.audit.query(&AuditQuery::default()).unwrap();
        assert_eq!(page.entries[0].action, "update-config");
        assert_eq!(page.entries[0].details["key"], "maintenance");
    }

    #[tokio::test]
    async fn config_update_requires_value() {
        let request: UpdateConfigRequest =
            serde_json::from_value(json!({"key": "maintenance"})).unwrap();
        let err = update_config(AdminOnly(admin()), State(test_state()), ApiJson(request))
            .await
            .unwrap_err();
        assert_eq!(err.code, "admin/missing-parameters");
    }

    #[tokio::test]
    async fn eligibility_report_uses_records() {
        let state = test_state();
        let record = state
            .records
            .create(&FinancialDeclaration::default(), "did:web:a", "N")
            .unwrap();
        let today = record.created_at.date_naive().to_string();

        let Json(report) = generate_report(
            AdminOnly(admin()),
            State(state),
            Path("eligibility".into()),
            report_params(Some(&today), Some(&today)),
        )
        .await
        .unwrap();
        assert_eq!(report.report_type, "eligibility");
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["data"]["title"], "Eligibility Report");
        assert_eq!(value["data"]["summary"]["totalChecks"], 1);
        assert_eq!(value["data"]["summary"]["avgEligibilityScore"], 100.0);
    }

    #[tokio::test]
    async fn users_report_counts_seeded_accounts() {
        let state = seeded_state().await;
        let today = Utc::now().date_naive().to_string();

        let Json(report) = generate_report(
            AdminOnly(admin()),
            State(state),
            Path("users".into()),
            report_params(Some(&today), Some(&today)),
        )
        .await
        .unwrap();
        let ReportData::Users(data) = report.data else {
            panic!("expected users report");
        };
        assert_eq!(data.summary.total_users, 2);
        assert_eq!(data.summary.new_users, 2);
    }

    #[tokio::test]
    async fn report_parameter_errors() {
        let cases = [
            ("eligibility", None, Some("2026-01-31"), "admin/missing-parameters"),
            ("revenue", None, None, "admin/missing-parameters"),
            ("revenue", Some("2026-01-01"), Some("2026-01-31"), "admin/invalid-report-type"),
            ("users", Some("01/01/2026"), Some("2026-01-31"), "admin/invalid-parameters"),
            ("users", Some("2026-02-01"), Some("2026-01-31"), "admin/invalid-parameters"),
        ];
        for (report_type, start, end, code) in cases {
            let err = generate_report(
                AdminOnly(admin()),
                State(test_state()),
                Path(report_type.into()),
                report_params(start, end),
            )
            .await
            .unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.code, code, "{report_type} {start:?} {end:?}");
        }
    }

    #[test]
    fn forwarded_for_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), None);
        headers.insert("x-forwarded-for", " 198.51.100.2 ".parse().unwrap());
        assert_eq!(client_ip(&headers).as_deref(), Some("198.51.100.2"));
    }
}
