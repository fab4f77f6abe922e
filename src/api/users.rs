// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    auth::{hash_password, AdminOnly, Auth, AuthenticatedUser, Role},
    error::{ApiError, ApiJson},
    models::{
        non_empty, CreateUserRequest, LinkDidRequest, LinkDidResponse, UpdateProfileRequest,
        UserListItem, UserProfileResponse, UserSummary,
    },
    state::AppState,
    storage::{StorageError, StoredUser},
};

fn user_not_found() -> ApiError {
    ApiError::not_found("user/not-found", "User not found")
}

/// Map a missing account to `user/not-found`.
fn lookup(result: Result<StoredUser, StorageError>) -> Result<StoredUser, ApiError> {
    result.map_err(|e| match e {
        StorageError::NotFound(_) => user_not_found(),
        other => other.into(),
    })
}

fn current_user(state: &AppState, user: &AuthenticatedUser) -> Result<StoredUser, ApiError> {
    lookup(state.users.get(&user.user_id))
}

/// Get the current authenticated user's profile.
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User profile", body = UserProfileResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Account no longer exists")
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<UserProfileResponse>, ApiError> {
    Ok(Json(current_user(&state, &user)?.into()))
}

/// Merge fields into the caller's profile.
///
/// Top-level keys in `profile` replace existing keys; other keys are kept.
#[utoipa::path(
    patch,
    path = "/users/me",
    tag = "Users",
    request_body = UpdateProfileRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated profile", body = UserProfileResponse),
        (status = 400, description = "Profile missing or not an object"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Account no longer exists")
    )
)]
pub async fn update_me(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserProfileResponse>, ApiError> {
    let Some(Value::Object(patch)) = request.profile else {
        return Err(ApiError::bad_request(
            "user/invalid-request",
            "Profile data is required",
        ));
    };

    let updated = lookup(state.users.update_profile(&user.user_id, patch))?;
    Ok(Json(updated.into()))
}

/// Link a DID to the caller's account.
///
/// The proof must be present but is not verified.
#[utoipa::path(
    post,
    path = "/users/link-did",
    tag = "Users",
    request_body = LinkDidRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "DID linked", body = LinkDidResponse),
        (status = 400, description = "DID or proof missing"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Account no longer exists")
    )
)]
pub async fn link_did(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiJson(request): ApiJson<LinkDidRequest>,
) -> Result<Json<LinkDidResponse>, ApiError> {
    let did = non_empty(&request.did);
    let has_proof = request.proof.as_ref().is_some_and(|p| !p.is_null());
    let (Some(did), true) = (did, has_proof) else {
        return Err(ApiError::bad_request(
            "user/missing-parameters",
            "DID and proof are required",
        ));
    };

    let updated = lookup(state.users.link_did(&user.user_id, did))?;
    tracing::info!(user_id = %updated.id, did, "DID linked");

    Ok(Json(LinkDidResponse {
        id: updated.id,
        username: updated.username,
        did: updated.did,
    }))
}

/// List all accounts. Admin only.
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = [UserListItem]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn list_users(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserListItem>>, ApiError> {
    let users = state.users.list()?;
    Ok(Json(users.into_iter().map(UserListItem::from).collect()))
}

/// Get any account by id. Admin only.
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "Users",
    params(("user_id" = String, Path, description = "User id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User profile", body = UserProfileResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfileResponse>, ApiError> {
    Ok(Json(lookup(state.users.get(&user_id))?.into()))
}

/// Create an account. Admin only.
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUserRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "User created", body = UserSummary),
        (status = 400, description = "Missing fields, username taken, or unknown role"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn create_user(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserSummary>), ApiError> {
    let (Some(username), Some(password)) =
        (non_empty(&request.username), non_empty(&request.password))
    else {
        return Err(ApiError::bad_request(
            "user/missing-parameters",
            "Username and password are required",
        ));
    };

    let role = match non_empty(&request.role) {
        None => Role::User,
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|e| ApiError::bad_request("user/invalid-role", e.to_string()))?,
    };

    let username_taken = || ApiError::bad_request("user/username-taken", "Username is already taken");

    match state.users.find_by_username(username) {
        Ok(_) => return Err(username_taken()),
        Err(StorageError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let password_hash = hash_password(password.to_string(), state.bcrypt_cost)
        .await
        .map_err(ApiError::internal)?;

    let created = state
        .users
        .insert(StoredUser {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash,
            role,
            did: None,
            profile: request.profile.unwrap_or_default(),
            created_at: Utc::now(),
        })
        .map_err(|e| match e {
            // Lost a race with a concurrent create
            StorageError::AlreadyExists(_) => username_taken(),
            other => other.into(),
        })?;

    tracing::info!(
        admin_id = %admin.user_id,
        user_id = %created.id,
        role = %created.role,
        "User created"
    );

    Ok((StatusCode::CREATED, Json(UserSummary::from(&created))))
}
