// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```
//!
//! Both services use the same extractors; any state that can hand out a
//! [`TokenIssuer`] via `FromRef` works.

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, AuthenticatedUser, Role, TokenIssuer};

/// Extractor for authenticated users.
///
/// Validates the bearer token from the Authorization header. A missing (or
/// empty) header is `auth/missing-token`; anything else that does not verify
/// is `auth/invalid-token`.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    TokenIssuer: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already verified earlier in this request
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .filter(|h| !h.is_empty())
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken("non-ASCII authorization header".into()))?;

        let token = bearer_token(header)
            .ok_or_else(|| AuthError::InvalidToken("expected 'Bearer <token>'".into()))?;

        let claims = TokenIssuer::from_ref(state).verify(token)?;
        let user = AuthenticatedUser::from_claims(claims);
        parts.extensions.insert(user.clone());

        Ok(Auth(user))
    }
}

/// Token part of a `Bearer <token>` header value.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Check that `user` holds one of `allowed`.
pub fn authorize(user: &AuthenticatedUser, allowed: &[Role]) -> Result<(), AuthError> {
    if user.has_any_role(allowed) {
        Ok(())
    } else {
        Err(AuthError::InsufficientPermissions)
    }
}

/// A static list of roles accepted by a route.
pub trait RoleSet {
    const ROLES: &'static [Role];
}

/// Roles accepted by admin routes.
pub struct AdminRoles;

impl RoleSet for AdminRoles {
    const ROLES: &'static [Role] = &[Role::Admin];
}

/// Extractor that requires the caller's role to be in `R::ROLES`.
pub struct Authorized<R: RoleSet> {
    pub user: AuthenticatedUser,
    _roles: PhantomData<fn() -> R>,
}

impl<R: RoleSet> Authorized<R> {
    pub fn into_user(self) -> AuthenticatedUser {
        self.user
    }
}

impl<S, R> FromRequestParts<S> for Authorized<R>
where
    TokenIssuer: FromRef<S>,
    S: Send + Sync,
    R: RoleSet,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;
        authorize(&user, R::ROLES)?;
        Ok(Authorized {
            user,
            _roles: PhantomData,
        })
    }
}

/// Extractor that requires admin role.
pub struct AdminOnly(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for AdminOnly
where
    TokenIssuer: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authorized = Authorized::<AdminRoles>::from_request_parts(parts, state).await?;
        Ok(AdminOnly(authorized.into_user()))
    }
}
