// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// Authentication and authorization failures.
///
/// Every request is classified independently: no token, a token that does
/// not verify, a verified token whose role is not accepted, or success.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header present
    #[error("Authentication token is required")]
    MissingToken,
    /// Header present but not a valid, unexpired token. The reason is logged,
    /// not returned.
    #[error("Invalid token")]
    InvalidToken(String),
    /// Token valid but the role is not accepted by the route
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    /// Route needs an authenticated caller and none was established
    #[error("User not authenticated")]
    Unauthenticated,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "auth/missing-token",
            AuthError::InvalidToken(_) => "auth/invalid-token",
            AuthError::InsufficientPermissions => "auth/insufficient-permissions",
            AuthError::Unauthenticated => "auth/unauthorized",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken(_) | AuthError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::new(err.status_code(), err.error_code(), err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::InvalidToken(reason) = &self {
            tracing::debug!(reason = %reason, "Rejected bearer token");
        }
        ApiError::from(self).into_response()
    }
}
