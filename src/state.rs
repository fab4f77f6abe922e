// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared state of the FEP service.
//!
//! Every store is created once at startup and handed to handlers through
//! `State<AppState>`. Cloning the state only clones `Arc`s.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::FromRef;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;

use crate::auth::{hash_password, AuthenticatedUser, PasswordError, Role, TokenIssuer};
use crate::config::FepConfig;
use crate::eligibility::{CredentialIssuer, Ed25519Signer, ProofSigner, SigningError};
use crate::storage::{
    AuditLog, ChallengeStore, EligibilityRecordStore, InMemoryRecordStore, InMemoryUserStore,
    StorageError, StoredUser, UserStore,
};

/// Identity the service reports about itself.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub environment: String,
    /// Domain of the served `did:web` document; the request host when unset.
    pub did_web_domain: Option<String>,
}

impl ServiceInfo {
    pub fn from_config(config: &FepConfig) -> Self {
        Self {
            name: config.service_name.clone(),
            version: config.service_version.clone(),
            environment: config.environment.clone(),
            did_web_domain: config.did_web_domain.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn EligibilityRecordStore>,
    pub users: Arc<dyn UserStore>,
    pub audit: Arc<AuditLog>,
    pub challenges: Arc<ChallengeStore>,
    /// Runtime settings changed through `PATCH /admin/config`.
    pub settings: Arc<RwLock<BTreeMap<String, Value>>>,
    pub tokens: TokenIssuer,
    pub credentials: CredentialIssuer,
    pub service: Arc<ServiceInfo>,
    pub started_at: Instant,
    pub bcrypt_cost: u32,
}

impl AppState {
    /// Production state: in-memory stores and an Ed25519 proof signer.
    ///
    /// The signing key is read from `FEP_SIGNING_KEY_PATH` when set and
    /// generated otherwise.
    pub fn from_config(config: &FepConfig) -> Result<Self, SigningError> {
        let verification_method = config.verification_method();
        let signer: Arc<dyn ProofSigner> = match &config.signing_key_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading credential signing key");
                Arc::new(Ed25519Signer::from_file(path, verification_method)?)
            }
            None => {
                tracing::warn!("FEP_SIGNING_KEY_PATH not set; generated an ephemeral signing key");
                Arc::new(Ed25519Signer::generate(verification_method)?)
            }
        };

        Ok(Self::new(
            TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_ttl),
            CredentialIssuer::new(
                config.issuer_did.clone(),
                config.credential_base_url.clone(),
                signer,
            ),
            ServiceInfo::from_config(config),
            config.bcrypt_cost,
        ))
    }

    /// State backed by the in-memory stores.
    pub fn new(
        tokens: TokenIssuer,
        credentials: CredentialIssuer,
        service: ServiceInfo,
        bcrypt_cost: u32,
    ) -> Self {
        Self::with_stores(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryUserStore::new()),
            tokens,
            credentials,
            service,
            bcrypt_cost,
        )
    }

    pub fn with_stores(
        records: Arc<dyn EligibilityRecordStore>,
        users: Arc<dyn UserStore>,
        tokens: TokenIssuer,
        credentials: CredentialIssuer,
        service: ServiceInfo,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            records,
            users,
            audit: Arc::new(AuditLog::new()),
            challenges: Arc::new(ChallengeStore::new()),
            settings: Arc::new(RwLock::new(BTreeMap::new())),
            tokens,
            credentials,
            service: Arc::new(service),
            started_at: Instant::now(),
            bcrypt_cost,
        }
    }

    /// The caller's current DID.
    ///
    /// The identity store wins over the token claim so a DID linked after
    /// login is honoured without a new token.
    pub fn caller_did(&self, user: &AuthenticatedUser) -> Option<String> {
        self.users
            .get(&user.user_id)
            .ok()
            .and_then(|stored| stored.did)
            .or_else(|| user.did.clone())
    }

    /// Insert the `admin` and `user` demo accounts.
    pub async fn seed_demo_users(&self) -> Result<(), SeedError> {
        let demo = [
            ("1", "admin", "admin123", Role::Admin, "did:web:admin.example.com", "Admin"),
            ("2", "user", "user123", Role::User, "did:web:user.example.com", "Regular"),
        ];

        for (id, username, password, role, did, first_name) in demo {
            let password_hash = hash_password(password.to_string(), self.bcrypt_cost).await?;
            let mut profile = Map::new();
            profile.insert("firstName".into(), json!(first_name));
            profile.insert("lastName".into(), json!("User"));
            profile.insert("email".into(), json!(format!("{username}@example.com")));

            self.users.insert(StoredUser {
                id: id.to_string(),
                username: username.to_string(),
                password_hash,
                role,
                did: Some(did.to_string()),
                profile,
                created_at: chrono::Utc::now(),
            })?;
        }

        tracing::info!(count = demo.len(), "Seeded demo users");
        Ok(())
    }
}

impl FromRef<AppState> for TokenIssuer {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn seeding_creates_demo_accounts() {
        let state = seeded_state().await;
        let admin = state.users.find_by_username("admin").unwrap();
        assert_eq!(admin.id, "1");
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.profile["email"], "admin@example.com");
        assert_ne!(admin.password_hash, "admin123");
        assert_eq!(state.users.list().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn seeding_twice_fails() {
        let state = seeded_state().await;
        assert!(matches!(
            state.seed_demo_users().await,
            Err(SeedError::Storage(StorageError::AlreadyExists(_)))
        ));
    }

    #[tokio::test]
    async fn caller_did_prefers_store() {
        let state = seeded_state().await;
        state.users.link_did("2", "did:web:new.example.com").unwrap();

        let did = state.caller_did(&user());
        assert_eq!(did.as_deref(), Some("did:web:new.example.com"));
    }

    #[test]
    fn caller_did_falls_back_to_token() {
        let state = test_state();
        let caller = caller("99", Role::Citizen, Some("did:web:token.example.com"));
        assert_eq!(
            state.caller_did(&caller).as_deref(),
            Some("did:web:token.example.com")
        );
        assert_eq!(state.caller_did(&super::test_support::caller("98", Role::User, None)), None);
    }
}
