// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles.
///
/// Authorization is plain set membership: a route names the roles it
/// accepts and the caller's role must be one of them. There is no hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Service administrator
    Admin,
    /// Regular account
    User,
    /// Benefits adviser acting for citizens
    Adviser,
    /// Member of the public
    Citizen,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::User, Role::Adviser, Role::Citizen];

    /// Whether this role is one of `allowed`.
    pub fn is_any_of(&self, allowed: &[Role]) -> bool {
        allowed.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Adviser => "adviser",
            Role::Citizen => "citizen",
        }
    }
}

impl Default for Role {
    /// Accounts created without an explicit role are regular users.
    fn default() -> Self {
        Role::User
    }
}

/// Error returned for an unrecognised role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "adviser" => Ok(Role::Adviser),
            "citizen" => Ok(Role::Citizen),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
