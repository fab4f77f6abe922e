// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login, token refresh and logout.

use axum::{extract::State, Json};

use crate::{
    auth::{verify_password, Auth, TokenSubject},
    error::{ApiError, ApiJson},
    models::{non_empty, LoginRequest, MessageResponse, TokenResponse, UserSummary},
    state::AppState,
    storage::StorageError,
};

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("auth/invalid-credentials", "Invalid username or password")
}

/// Exchange a username and password for a bearer token.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let (Some(username), Some(password)) =
        (non_empty(&request.username), non_empty(&request.password))
    else {
        return Err(ApiError::bad_request(
            "auth/missing-credentials",
            "Username and password are required",
        ));
    };

    let user = match state.users.find_by_username(username) {
        Ok(user) => user,
        Err(StorageError::NotFound(_)) => {
            tracing::info!(username, "Login failed: unknown username");
            return Err(invalid_credentials());
        }
        Err(e) => return Err(e.into()),
    };

    let matches = verify_password(password.to_string(), user.password_hash.clone())
        .await
        .map_err(ApiError::internal)?;
    if !matches {
        tracing::info!(username, "Login failed: wrong password");
        return Err(invalid_credentials());
    }

    let token = state
        .tokens
        .issue(&TokenSubject {
            sub: user.id.clone(),
            username: Some(user.username.clone()),
            role: user.role,
            did: user.did.clone(),
            email: None,
        })
        .map_err(ApiError::internal)?;

    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok(Json(TokenResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

/// Issue a fresh token for the caller.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "New token", body = TokenResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<TokenResponse>, ApiError> {
    let mut subject = user.to_subject();
    subject.did = state.caller_did(&user);

    let token = state.tokens.issue(&subject).map_err(ApiError::internal)?;

    Ok(Json(TokenResponse {
        token,
        user: UserSummary {
            id: user.user_id,
            username: user.username.unwrap_or_default(),
            role: user.role,
        },
    }))
}

/// Log out. Tokens are stateless, so this only acknowledges the request.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(Auth(_user): Auth) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Successfully logged out".to_string(),
    })
}
