// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Funeral-expenses form relay
//!
//! A small companion service: applicants register with an email address,
//! save or submit their claim form as free-form JSON, and receive a
//! time-limited link to download the submitted copy.
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | GET | `/` | none |
//! | POST | `/api/auth/register` | none |
//! | POST | `/api/auth/login` | none |
//! | POST | `/api/forms/submit` | bearer |
//! | GET | `/api/forms/resume` | bearer |
//! | GET | `/api/forms/download` | signed link |

use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};

use crate::{
    api::{method_not_allowed, not_found, with_common_layers},
    auth::{AuthError, AuthenticatedUser, TokenIssuer},
    config::FormsConfig,
    storage::{BlobStore, FormUserStore, FsBlobStore, InMemoryFormUserStore, StorageResult},
};

pub mod auth;
pub mod links;
pub mod submissions;

pub use links::{LinkError, UrlSigner, DOWNLOAD_PATH};

/// Shared state of the form relay.
#[derive(Clone)]
pub struct FormsState {
    pub users: Arc<dyn FormUserStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub links: UrlSigner,
    pub tokens: TokenIssuer,
    pub bcrypt_cost: u32,
}

impl FormsState {
    pub fn new(
        users: Arc<dyn FormUserStore>,
        blobs: Arc<dyn BlobStore>,
        links: UrlSigner,
        tokens: TokenIssuer,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            blobs,
            links,
            tokens,
            bcrypt_cost,
        }
    }

    /// In-memory accounts and blobs on disk under `DATA_DIR`.
    pub fn from_config(config: &FormsConfig) -> StorageResult<Self> {
        let secret = config.jwt_secret.as_bytes();
        Ok(Self::new(
            Arc::new(InMemoryFormUserStore::new()),
            Arc::new(FsBlobStore::new(&config.data_dir)?),
            UrlSigner::new(
                secret.to_vec(),
                config.public_base_url.clone(),
                config.download_url_ttl,
            ),
            TokenIssuer::new(secret, config.token_ttl),
            config.bcrypt_cost,
        ))
    }
}

impl FromRef<FormsState> for TokenIssuer {
    fn from_ref(state: &FormsState) -> Self {
        state.tokens.clone()
    }
}

/// Email of a form relay caller.
///
/// Tokens without an `email` claim were not issued by the relay and do not
/// identify an applicant.
pub fn caller_email(user: &AuthenticatedUser) -> Result<&str, AuthError> {
    user.email.as_deref().ok_or(AuthError::Unauthenticated)
}

pub fn router(state: FormsState) -> Router {
    let routes = Router::new()
        .route("/", get(submissions::root))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/forms/submit", post(submissions::submit))
        .route("/api/forms/resume", get(submissions::resume))
        .route(DOWNLOAD_PATH, get(submissions::download))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state);

    with_common_layers(routes)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::storage::InMemoryBlobStore;
    use chrono::Duration;

    pub fn forms_state() -> FormsState {
        FormsState::new(
            Arc::new(InMemoryFormUserStore::new()),
            Arc::new(InMemoryBlobStore::new()),
            UrlSigner::new(
                b"forms-test-secret".to_vec(),
                url::Url::parse("http://localhost:5000").unwrap(),
                Duration::hours(1),
            ),
            TokenIssuer::new(b"forms-test-secret", Duration::days(30)),
            4,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::forms_state;
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn json(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn root_reports_running() {
        let app = router(forms_state());
        let (status, body) = call(&app, Method::GET, "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"API is running...");
    }

    #[tokio::test]
    async fn register_submit_resume_download() {
        let app = router(forms_state());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"name": "Jo", "email": "jo@example.com", "password": "pw"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let token = json(&body)["token"].as_str().unwrap().to_string();

        let (status, body) = call(&app, Method::GET, "/api/forms/resume", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json(&body)["error"]["code"], "form/not-found");

        let form = json!({"deceased": {"name": "A"}, "costs": [1200]});
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/forms/submit",
            Some(&token),
            Some(form.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let submitted = json(&body);
        assert_eq!(submitted["message"], "Form submitted successfully");
        let link = url::Url::parse(submitted["downloadUrl"].as_str().unwrap()).unwrap();

        let (status, body) = call(&app, Method::GET, "/api/forms/resume", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body), form);

        let uri = format!("{}?{}", link.path(), link.query().unwrap());
        let (status, body) = call(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body), form);
    }

    #[tokio::test]
    async fn submit_requires_token() {
        let app = router(forms_state());
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/forms/submit",
            None,
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json(&body)["error"]["code"], "auth/missing-token");
    }

    #[tokio::test]
    async fn token_without_email_is_not_an_applicant() {
        let state = forms_state();
        let token = state
            .tokens
            .issue(&crate::auth::TokenSubject {
                sub: "2".to_string(),
                username: Some("user".to_string()),
                ..Default::default()
            })
            .unwrap();
        let app = router(state);

        let (status, body) = call(&app, Method::GET, "/api/forms/resume", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json(&body)["error"]["code"], "auth/unauthorized");
    }
}
