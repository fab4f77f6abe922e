// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication and role authorization shared by the FEP
//! service and the form relay.
//!
//! ## Auth Flow
//!
//! 1. Client logs in with a username/email and password
//! 2. Service verifies the bcrypt hash and signs an HS256 token carrying
//!    `sub`, `role` and (FEP) the linked DID
//! 3. Client sends `Authorization: Bearer <token>`
//! 4. The `Auth` extractor verifies signature and expiry; `AdminOnly` /
//!    `Authorized<R>` additionally check the role
//!
//! ## Classification
//!
//! | Situation | Status | Code |
//! |-----------|--------|------|
//! | no header | 401 | `auth/missing-token` |
//! | bad scheme, bad signature, expired | 401 | `auth/invalid-token` |
//! | role not accepted | 403 | `auth/insufficient-permissions` |

pub mod claims;
pub mod error;
pub mod extractor;
pub mod password;
pub mod roles;
pub mod tokens;

pub use claims::{AuthenticatedUser, TokenClaims, TokenSubject};
pub use error::AuthError;
pub use extractor::{authorize, AdminOnly, AdminRoles, Auth, Authorized, RoleSet};
pub use password::{hash_password, verify_password, PasswordError, DEFAULT_BCRYPT_COST};
pub use roles::Role;
pub use tokens::{TokenIssuer, TokenSigningError};
