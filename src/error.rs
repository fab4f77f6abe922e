// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! API error type shared by every handler.
//!
//! Errors serialize as `{"error":{"code":"<domain>/<reason>","message":"..."}}`.
//! Internal errors keep their detail in the server log only.

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Request,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::storage::StorageError;

/// Generic code returned for every 500.
pub const INTERNAL_ERROR_CODE: &str = "server/internal-error";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn unauthorized(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    pub fn forbidden(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, code, message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    /// Log `detail` and return the generic 500.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Internal server error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            INTERNAL_ERROR_CODE,
            "An internal server error occurred",
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: ErrorDetail {
                code: &self.code,
                message: &self.message,
            },
        });
        (self.status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request("request/invalid-body", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request("request/invalid-query", rejection.body_text())
    }
}

/// Storage failures that reach a handler unmapped are internal errors.
impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::internal(err)
    }
}

/// JSON body extractor that rejects with the structured error body.
///
/// An empty body is read as `{}`, so handlers see absent fields and report
/// their own missing-parameter errors. A non-empty body must be sent as
/// `application/json`.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = has_json_content_type(req.headers());
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request("request/invalid-body", e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_slice(b"{}")
                .map(ApiJson)
                .map_err(|e| ApiError::bad_request("request/invalid-body", e.to_string()));
        }
        if !is_json {
            return Err(ApiError::bad_request(
                "request/invalid-body",
                "Expected request with `Content-Type: application/json`",
            ));
        }
        let Json(value) = Json::<T>::from_bytes(&bytes)?;
        Ok(ApiJson(value))
    }
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Query string extractor that rejects with the structured error body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_code() {
        let nf = ApiError::not_found("eligibility/not-found", "missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.code, "eligibility/not-found");
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("user/invalid-request", "bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        let forbidden = ApiError::forbidden("auth/insufficient-permissions", "no");
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

        let conflict = ApiError::conflict("x/y", "dup");
        assert_eq!(conflict.status, StatusCode::CONFLICT);
    }

    #[test]
    fn internal_hides_detail() {
        let err = ApiError::internal("database exploded at row 7");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, INTERNAL_ERROR_CODE);
        assert!(!err.message.contains("row 7"));
    }

    #[derive(Debug, serde::Deserialize)]
    struct Named {
        name: Option<String>,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(axum::body::Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn empty_body_reads_as_empty_object() {
        for content_type in [None, Some("application/json")] {
            let ApiJson(named) = ApiJson::<Named>::from_request(request(content_type, ""), &())
                .await
                .unwrap();
            assert!(named.name.is_none());
        }
    }

    #[tokio::test]
    async fn json_body_needs_json_content_type() {
        let ApiJson(named) = ApiJson::<Named>::from_request(
            request(Some("application/json; charset=utf-8"), r#"{"name":"jo"}"#),
            &(),
        )
        .await
        .unwrap();
        assert_eq!(named.name.as_deref(), Some("jo"));

        let err = ApiJson::<Named>::from_request(request(Some("text/plain"), r#"{"name":"jo"}"#), &())
            .await
            .unwrap_err();
        assert_eq!(err.code, "request/invalid-body");

        let err = ApiJson::<Named>::from_request(request(Some("application/json"), "{oops"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "request/invalid-body");
    }

    #[tokio::test]
    async fn into_response_returns_nested_json_body() {
        let response = ApiError::bad_request("eligibility/missing-parameters", "bad data")
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(
            body,
            r#"{"error":{"code":"eligibility/missing-parameters","message":"bad data"}}"#
        );
    }
}
