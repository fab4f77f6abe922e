// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Publication of the OpenAPI document to the API registry.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use utoipa::OpenApi;

use crate::{api::ApiDoc, config::FepConfig};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("API registry request failed: {0}")]
    Request(String),

    #[error("API registry returned {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Body of `POST {registry}/specs`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecPublication {
    pub service_name: String,
    pub version: String,
    pub specification: serde_json::Value,
    pub description: String,
}

impl SpecPublication {
    pub fn new(service_name: &str, version: &str, specification: serde_json::Value) -> Self {
        Self {
            service_name: service_name.to_string(),
            version: version.to_string(),
            specification,
            description: format!("API specification for {service_name}"),
        }
    }
}

pub struct RegistryClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RegistryClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, RegistryError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RegistryError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub async fn publish(&self, publication: &SpecPublication) -> Result<(), RegistryError> {
        let response = self
            .http
            .post(format!("{}/specs", self.base_url))
            .header("X-API-Key", &self.api_key)
            .json(publication)
            .send()
            .await
            .map_err(|e| RegistryError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Rejected { status, body });
        }
        Ok(())
    }
}

/// Publish the service's OpenAPI document, logging the outcome.
///
/// Does nothing when no registry key is configured.
pub async fn publish_api_spec(config: &FepConfig) {
    let Some(api_key) = config.api_registry_key.as_deref() else {
        tracing::warn!("API_REGISTRY_KEY not set; API specification will not be published");
        return;
    };

    let specification = match serde_json::to_value(ApiDoc::openapi()) {
        Ok(spec) => spec,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize API specification");
            return;
        }
    };
    let publication =
        SpecPublication::new(&config.service_name, &config.service_version, specification);

    let result = match RegistryClient::new(&config.api_registry_url, api_key) {
        Ok(client) => client.publish(&publication).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => tracing::info!(
            service = %publication.service_name,
            version = %publication.version,
            "API specification published"
        ),
        Err(e) => tracing::error!(error = %e, "Error publishing API specification"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
    use std::sync::{Arc, Mutex};

    type Received = Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>;

    async fn record(
        State(received): State<Received>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> &'static str {
        let key = headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        received.lock().unwrap().push((key, body));
        "ok"
    }

    async fn fake_registry() -> (String, Received) {
        let received: Received = Arc::default();
        let app = Router::new()
            .route("/specs", post(record))
            .with_state(received.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/"), received)
    }

    #[test]
    fn publication_body_shape() {
        let body = serde_json::to_value(SpecPublication::new(
            "fep-service",
            "1.0.0",
            serde_json::json!({"openapi": "3.1.0"}),
        ))
        .unwrap();
        assert_eq!(body["serviceName"], "fep-service");
        assert_eq!(body["version"], "1.0.0");
        assert_eq!(body["description"], "API specification for fep-service");
        assert_eq!(body["specification"]["openapi"], "3.1.0");
    }

    #[tokio::test]
    async fn publishes_with_api_key() {
        let (url, received) = fake_registry().await;
        let client = RegistryClient::new(&url, "registry-key").unwrap();
        client
            .publish(&SpecPublication::new(
                "fep-service",
                "1.0.0",
                serde_json::json!({}),
            ))
            .await
            .unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0.as_deref(), Some("registry-key"));
        assert_eq!(received[0].1["serviceName"], "fep-service");
    }

    #[tokio::test]
    async fn rejection_is_reported() {
        let app = Router::new().route(
            "/specs",
            post(|| async { (axum::http::StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = RegistryClient::new(&format!("http://{addr}"), "wrong").unwrap();
        let err = client
            .publish(&SpecPublication::new("fep-service", "1.0.0", serde_json::json!({})))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Rejected { status, .. } if status == reqwest::StatusCode::UNAUTHORIZED
        ));
    }

    #[tokio::test]
    async fn unreachable_registry_is_an_error() {
        let client = RegistryClient::new("http://127.0.0.1:1", "key").unwrap();
        let err = client
            .publish(&SpecPublication::new("fep-service", "1.0.0", serde_json::json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Request(_)));
    }
}
