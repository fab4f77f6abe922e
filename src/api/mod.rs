// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface of the FEP service.

use axum::{
    http::{HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    eligibility::{CredentialProof, EligibilitySubject, FinancialDeclaration, VerifiableCredential},
    error::ApiError,
    models::{
        ChallengeResponse, CreateUserRequest, CredentialStatusResponse, EligibilityCheckRequest,
        EligibilityCheckResponse, EligibilityRecordView, IssueCredentialResponse, LinkDidRequest,
        LinkDidResponse, LoginRequest, MessageResponse, TokenResponse, UpdateProfileRequest,
        UserListItem, UserProfileResponse, UserSummary, VerifyDidRequest, VerifyDidResponse,
    },
    state::AppState,
    storage::AuditEntry,
};

pub mod admin;
pub mod auth;
pub mod did;
pub mod eligibility;
pub mod health;
pub mod users;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/.well-known/did.json", get(health::did_document))
        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/me", get(users::get_me).patch(users::update_me))
        .route("/users/link-did", post(users::link_did))
        .route("/users/{user_id}", get(users::get_user))
        // Eligibility
        .route("/eligibility/check", post(eligibility::check_eligibility))
        .route(
            "/eligibility/credentials/{credential_id}/status",
            get(eligibility::credential_status),
        )
        .route("/eligibility/{record_id}", get(eligibility::get_record))
        .route(
            "/eligibility/{record_id}/issue-credential",
            post(eligibility::issue_credential),
        )
        // DID
        .route("/did/challenge", post(did::create_challenge))
        .route("/did/verify", post(did::verify_did))
        // Admin
        .route("/admin/status", get(admin::get_status))
        .route(
            "/admin/audit-log",
            get(admin::get_audit_log).post(admin::create_audit_entry),
        )
        .route("/admin/config", patch(admin::update_config))
        .route("/admin/reports/{report_type}", get(admin::generate_report))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state);

    with_common_layers(
        routes.merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi())),
    )
}

/// CORS, request ids, tracing and panic recovery shared by both services.
pub fn with_common_layers(router: Router) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    ApiError::internal("handler panicked").into_response()
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Financial Eligibility Passport",
        description = "Eligibility checks and verifiable credentials for funeral expenses support."
    ),
    paths(
        health::health,
        health::did_document,
        auth::login,
        auth::refresh,
        auth::logout,
        users::get_me,
        users::update_me,
        users::link_did,
        users::list_users,
        users::get_user,
        users::create_user,
        eligibility::check_eligibility,
        eligibility::get_record,
        eligibility::issue_credential,
        eligibility::credential_status,
        did::create_challenge,
        did::verify_did,
        admin::get_status,
        admin::get_audit_log,
        admin::create_audit_entry,
        admin::update_config,
        admin::generate_report
    ),
    components(
        schemas(
            LoginRequest,
            TokenResponse,
            UserSummary,
            MessageResponse,
            UserProfileResponse,
            UpdateProfileRequest,
            LinkDidRequest,
            LinkDidResponse,
            UserListItem,
            CreateUserRequest,
            EligibilityCheckRequest,
            EligibilityCheckResponse,
            EligibilityRecordView,
            FinancialDeclaration,
            IssueCredentialResponse,
            VerifiableCredential,
            EligibilitySubject,
            CredentialProof,
            CredentialStatusResponse,
            ChallengeResponse,
            VerifyDidRequest,
            VerifyDidResponse,
            AuditEntry,
            admin::StatusResponse,
            admin::AuditLogResponse,
            admin::UpdateConfigResponse,
            admin::ReportResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and DID document"),
        (name = "Auth", description = "Login and token refresh"),
        (name = "Users", description = "Profiles, DID linking and account management"),
        (name = "Eligibility", description = "Eligibility checks and credential issuance"),
        (name = "DID", description = "DID challenge/response"),
        (name = "Admin", description = "Service status, audit log, configuration and reports")
    )
)]
pub struct ApiDoc;

/// Response used when a request cannot be routed.
pub async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "request/not-found", "No such endpoint")
}

/// Response used when the path exists but not for this method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::new(
        StatusCode::METHOD_NOT_ALLOWED,
        "request/method-not-allowed",
        "Method not allowed for this endpoint",
    )
}
