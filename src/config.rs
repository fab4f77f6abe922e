// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Both services are configured from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3003` (FEP), `5000` (forms) |
//! | `JWT_SECRET` | HS256 token signing secret | Required |
//! | `JWT_TTL_SECS` | Token lifetime | `3600` (FEP), `2592000` (forms) |
//! | `BCRYPT_COST` | Password hashing cost | `10` |
//! | `SERVICE_NAME` | Service name reported by health/status | `fep-service` |
//! | `SERVICE_VERSION` | Service version | `1.0.0` |
//! | `APP_ENV` | Environment label | `development` |
//! | `DID_WEB_DOMAIN` | Domain of the served `did:web` document | request `Host` |
//! | `FEP_ISSUER_DID` | Credential issuer DID | `did:web:fep.gov.uk` |
//! | `FEP_CREDENTIAL_BASE_URL` | Prefix of credential ids | `https://fep.gov.uk/credentials` |
//! | `FEP_SIGNING_KEY_PATH` | PKCS#8 Ed25519 key; generated when unset | Optional |
//! | `SEED_DEMO_USERS` | Seed the `admin` and `user` accounts | `false` |
//! | `API_REGISTRY_URL` | API registry base URL | `http://api-registry:3005` |
//! | `API_REGISTRY_KEY` | API registry key; publication skipped when unset | Optional |
//! | `DATA_DIR` | Blob storage root (forms) | `./data` |
//! | `PUBLIC_BASE_URL` | Base of signed download links (forms) | `http://localhost:5000` |
//! | `DOWNLOAD_URL_TTL_SECS` | Signed link lifetime (forms) | `3600` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;

use crate::auth::DEFAULT_BCRYPT_COST;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_TTL_SECS_ENV: &str = "JWT_TTL_SECS";
pub const BCRYPT_COST_ENV: &str = "BCRYPT_COST";
pub const SERVICE_NAME_ENV: &str = "SERVICE_NAME";
pub const SERVICE_VERSION_ENV: &str = "SERVICE_VERSION";
pub const APP_ENV_ENV: &str = "APP_ENV";
pub const DID_WEB_DOMAIN_ENV: &str = "DID_WEB_DOMAIN";
pub const FEP_ISSUER_DID_ENV: &str = "FEP_ISSUER_DID";
pub const FEP_CREDENTIAL_BASE_URL_ENV: &str = "FEP_CREDENTIAL_BASE_URL";
pub const FEP_SIGNING_KEY_PATH_ENV: &str = "FEP_SIGNING_KEY_PATH";
pub const SEED_DEMO_USERS_ENV: &str = "SEED_DEMO_USERS";
pub const API_REGISTRY_URL_ENV: &str = "API_REGISTRY_URL";
pub const API_REGISTRY_KEY_ENV: &str = "API_REGISTRY_KEY";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const PUBLIC_BASE_URL_ENV: &str = "PUBLIC_BASE_URL";
pub const DOWNLOAD_URL_TTL_SECS_ENV: &str = "DOWNLOAD_URL_TTL_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_FEP_PORT: u16 = 3003;
pub const DEFAULT_FORMS_PORT: u16 = 5000;
pub const DEFAULT_FEP_TOKEN_TTL_SECS: i64 = 3600;
pub const DEFAULT_FORMS_TOKEN_TTL_SECS: i64 = 30 * 24 * 3600;
pub const DEFAULT_SERVICE_NAME: &str = "fep-service";
pub const DEFAULT_SERVICE_VERSION: &str = "1.0.0";
pub const DEFAULT_APP_ENV: &str = "development";
pub const DEFAULT_ISSUER_DID: &str = "did:web:fep.gov.uk";
pub const DEFAULT_CREDENTIAL_BASE_URL: &str = "https://fep.gov.uk/credentials";
pub const DEFAULT_API_REGISTRY_URL: &str = "http://api-registry:3005";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_DOWNLOAD_URL_TTL_SECS: i64 = 3600;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("expected 'json' or 'pretty', got '{other}'")),
        }
    }
}

/// Lookup of raw environment values. `std::env::var` in production, a map in
/// tests.
struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.trim().is_empty())
    }

    fn string(&self, name: &str, default: &str) -> String {
        self.raw(name).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.raw(name).ok_or(ConfigError::Missing(name))
    }

    fn parsed<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.raw(name) {
            None => Ok(default),
            Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value,
            }),
        }
    }

    fn flag(&self, name: &'static str) -> Result<bool, ConfigError> {
        match self.raw(name).map(|v| v.to_ascii_lowercase()) {
            None => Ok(false),
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
            Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
            Some(value) => Err(ConfigError::Invalid {
                name,
                value,
                reason: "expected a boolean".to_string(),
            }),
        }
    }

    fn seconds(&self, name: &'static str, default: i64) -> Result<Duration, ConfigError> {
        let secs: i64 = self.parsed(name, default)?;
        if secs <= 0 {
            return Err(ConfigError::Invalid {
                name,
                value: secs.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(Duration::seconds(secs))
    }

    fn bind_addr(&self, default_port: u16) -> Result<SocketAddr, ConfigError> {
        let host = self.string(HOST_ENV, DEFAULT_HOST);
        let port: u16 = self.parsed(PORT_ENV, default_port)?;
        format!("{host}:{port}")
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: HOST_ENV,
                value: host,
                reason: e.to_string(),
            })
    }

    fn bcrypt_cost(&self) -> Result<u32, ConfigError> {
        let cost: u32 = self.parsed(BCRYPT_COST_ENV, DEFAULT_BCRYPT_COST)?;
        if !(4..=31).contains(&cost) {
            return Err(ConfigError::Invalid {
                name: BCRYPT_COST_ENV,
                value: cost.to_string(),
                reason: "must be between 4 and 31".to_string(),
            });
        }
        Ok(cost)
    }
}

fn process_env() -> Env<impl Fn(&str) -> Option<String>> {
    Env {
        lookup: |name: &str| std::env::var(name).ok(),
    }
}

/// Settings read by `main` before the tracing subscriber exists.
pub fn log_format_from_env() -> LogFormat {
    process_env()
        .raw(LOG_FORMAT_ENV)
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

/// Financial Eligibility Passport service configuration.
#[derive(Debug, Clone)]
pub struct FepConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    pub did_web_domain: Option<String>,
    pub issuer_did: String,
    pub credential_base_url: String,
    pub signing_key_path: Option<PathBuf>,
    pub seed_demo_users: bool,
    pub api_registry_url: String,
    pub api_registry_key: Option<String>,
}

impl FepConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(process_env())
    }

    fn load<F>(env: Env<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            bind_addr: env.bind_addr(DEFAULT_FEP_PORT)?,
            jwt_secret: env.required(JWT_SECRET_ENV)?,
            token_ttl: env.seconds(JWT_TTL_SECS_ENV, DEFAULT_FEP_TOKEN_TTL_SECS)?,
            bcrypt_cost: env.bcrypt_cost()?,
            service_name: env.string(SERVICE_NAME_ENV, DEFAULT_SERVICE_NAME),
            service_version: env.string(SERVICE_VERSION_ENV, DEFAULT_SERVICE_VERSION),
            environment: env.string(APP_ENV_ENV, DEFAULT_APP_ENV),
            did_web_domain: env.raw(DID_WEB_DOMAIN_ENV),
            issuer_did: env.string(FEP_ISSUER_DID_ENV, DEFAULT_ISSUER_DID),
            credential_base_url: env
                .string(FEP_CREDENTIAL_BASE_URL_ENV, DEFAULT_CREDENTIAL_BASE_URL),
            signing_key_path: env.raw(FEP_SIGNING_KEY_PATH_ENV).map(PathBuf::from),
            seed_demo_users: env.flag(SEED_DEMO_USERS_ENV)?,
            api_registry_url: env.string(API_REGISTRY_URL_ENV, DEFAULT_API_REGISTRY_URL),
            api_registry_key: env.raw(API_REGISTRY_KEY_ENV),
        })
    }

    /// Verification method used in credential proofs.
    pub fn verification_method(&self) -> String {
        format!("{}#key-1", self.issuer_did)
    }
}

/// Funeral-expenses form relay configuration.
#[derive(Debug, Clone)]
pub struct FormsConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub data_dir: PathBuf,
    pub public_base_url: url::Url,
    pub download_url_ttl: Duration,
}

impl FormsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(process_env())
    }

    fn load<F>(env: Env<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            bind_addr: env.bind_addr(DEFAULT_FORMS_PORT)?,
            jwt_secret: env.required(JWT_SECRET_ENV)?,
            token_ttl: env.seconds(JWT_TTL_SECS_ENV, DEFAULT_FORMS_TOKEN_TTL_SECS)?,
            bcrypt_cost: env.bcrypt_cost()?,
            data_dir: PathBuf::from(env.string(DATA_DIR_ENV, DEFAULT_DATA_DIR)),
            public_base_url: env.parsed(
                PUBLIC_BASE_URL_ENV,
                url::Url::parse(DEFAULT_PUBLIC_BASE_URL).map_err(|e| ConfigError::Invalid {
                    name: PUBLIC_BASE_URL_ENV,
                    value: DEFAULT_PUBLIC_BASE_URL.to_string(),
                    reason: e.to_string(),
                })?,
            )?,
            download_url_ttl: env
                .seconds(DOWNLOAD_URL_TTL_SECS_ENV, DEFAULT_DOWNLOAD_URL_TTL_SECS)?,
        })
    }
}
