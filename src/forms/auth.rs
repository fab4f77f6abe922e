// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Email/password accounts for the form relay.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use super::FormsState;
use crate::{
    auth::{hash_password, verify_password, TokenSubject},
    error::{ApiError, ApiJson},
    models::non_empty,
    storage::{FormUser, StorageError},
};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Returned by both register and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub name: String,
    pub email: String,
    pub token: String,
}

fn user_exists() -> ApiError {
    ApiError::bad_request("auth/user-exists", "User already exists")
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("auth/invalid-credentials", "Invalid email or password")
}

fn token_for(state: &FormsState, email: &str) -> Result<String, ApiError> {
    state
        .tokens
        .issue(&TokenSubject {
            sub: email.to_string(),
            email: Some(email.to_string()),
            ..Default::default()
        })
        .map_err(ApiError::internal)
}

pub async fn register(
    State(state): State<FormsState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let (Some(name), Some(email), Some(password)) = (
        non_empty(&request.name),
        non_empty(&request.email),
        non_empty(&request.password),
    ) else {
        return Err(ApiError::bad_request(
            "auth/missing-fields",
            "Name, email and password are required",
        ));
    };

    if state.users.find_by_email(email)?.is_some() {
        return Err(user_exists());
    }

    let password_hash = hash_password(password.to_string(), state.bcrypt_cost)
        .await
        .map_err(ApiError::internal)?;

    state
        .users
        .create_user(FormUser {
            email: email.to_string(),
            name: name.to_string(),
            password_hash,
            form_data: None,
        })
        .map_err(|e| match e {
            StorageError::AlreadyExists(_) => user_exists(),
            other => other.into(),
        })?;

    tracing::info!(email, "Form relay account registered");

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            name: name.to_string(),
            token: token_for(&state, email)?,
            email: email.to_string(),
        }),
    ))
}

pub async fn login(
    State(state): State<FormsState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let (Some(email), Some(password)) = (non_empty(&request.email), non_empty(&request.password))
    else {
        return Err(invalid_credentials());
    };

    let Some(user) = state.users.find_by_email(email)? else {
        return Err(invalid_credentials());
    };

    let matches = verify_password(password.to_string(), user.password_hash.clone())
        .await
        .map_err(ApiError::internal)?;
    if !matches {
        tracing::info!(email, "Form relay login failed");
        return Err(invalid_credentials());
    }

    Ok(Json(AccountResponse {
        token: token_for(&state, &user.email)?,
        name: user.name,
        email: user.email,
    }))
}
