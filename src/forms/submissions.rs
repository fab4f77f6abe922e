// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Form submission, resume and signed download.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{caller_email, FormsState};
use crate::{
    auth::Auth,
    error::{ApiError, ApiJson, ApiQuery},
    storage::StorageError,
};

/// Blob key of the final copy of a user's form.
pub fn final_form_key(email: &str) -> String {
    format!("forms/{email}-final.json")
}

fn form_not_found() -> ApiError {
    ApiError::not_found("form/not-found", "No saved form data found")
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub message: String,
    pub download_url: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub key: Option<String>,
    pub expires: Option<String>,
    pub signature: Option<String>,
}

pub async fn root() -> &'static str {
    "API is running..."
}

/// Save the form, write the final copy and return a download link.
///
/// The saved form is written before the blob. A failed blob write leaves the
/// saved form in place and returns 500.
pub async fn submit(
    State(state): State<FormsState>,
    Auth(user): Auth,
    ApiJson(form): ApiJson<Value>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let email = caller_email(&user)?;

    state
        .users
        .save_form_data(email, form.clone())
        .map_err(|e| match e {
            StorageError::NotFound(_) => {
                ApiError::unauthorized("auth/invalid-token", "Account no longer exists")
            }
            other => other.into(),
        })?;

    let key = final_form_key(email);
    let bytes = serde_json::to_vec(&form).map_err(ApiError::internal)?;
    if let Err(e) = state.blobs.put(&key, &bytes, "application/json") {
        tracing::error!(error = %e, key = %key, "Saved form but failed to write final copy");
        return Err(ApiError::internal(e));
    }

    let url = state
        .links
        .presign(&key, Utc::now())
        .map_err(ApiError::internal)?;

    tracing::info!(email, key = %key, "Form submitted");

    Ok(Json(SubmitResponse {
        message: "Form submitted successfully".to_string(),
        download_url: url.to_string(),
    }))
}

/// Return the caller's saved form.
pub async fn resume(
    State(state): State<FormsState>,
    Auth(user): Auth,
) -> Result<Json<Value>, ApiError> {
    state
        .users
        .form_data(caller_email(&user)?)?
        .map(Json)
        .ok_or_else(form_not_found)
}

/// Serve a stored form through a signed link.
pub async fn download(
    State(state): State<FormsState>,
    ApiQuery(params): ApiQuery<DownloadParams>,
) -> Result<Response, ApiError> {
    let expires = params.expires.and_then(|e| e.parse::<i64>().ok());
    let (Some(key), Some(expires), Some(signature)) = (params.key, expires, params.signature)
    else {
        return Err(ApiError::forbidden("form/invalid-link", "Download link is incomplete"));
    };

    state
        .links
        .verify(&key, expires, &signature, Utc::now())
        .map_err(|e| ApiError::forbidden(e.error_code(), e.to_string()))?;

    let blob = state.blobs.get(&key).map_err(|e| match e {
        StorageError::NotFound(_) | StorageError::InvalidKey(_) => form_not_found(),
        other => other.into(),
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, blob.content_type)],
        blob.bytes,
    )
        .into_response())
}
