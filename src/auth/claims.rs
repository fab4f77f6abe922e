// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token claims and the authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Identity written into a token at issuance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSubject {
    /// FEP user id, or the email address for the form relay.
    pub sub: String,
    pub username: Option<String>,
    pub role: Role,
    pub did: Option<String>,
    pub email: Option<String>,
}

/// Claims carried by a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Missing role means a regular user.
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated caller, extracted from a verified token.
///
/// This is the type handlers receive from the `Auth` extractor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Token subject (user id or email)
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub role: Role,
    /// DID the caller held when the token was issued
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Token expiration (Unix timestamp)
    #[serde(skip)]
    pub expires_at: i64,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
            did: claims.did,
            email: claims.email,
            expires_at: claims.exp,
        }
    }

    /// Check if the user's role is in `allowed`.
    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        self.role.is_any_of(allowed)
    }

    /// Check if this user is an admin.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The subject to embed when re-issuing a token for this caller.
    pub fn to_subject(&self) -> TokenSubject {
        TokenSubject {
            sub: self.user_id.clone(),
            username: self.username.clone(),
            role: self.role,
            did: self.did.clone(),
            email: self.email.clone(),
        }
    }
}
