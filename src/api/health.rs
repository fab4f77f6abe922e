// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Liveness and the service's `did:web` document.

use axum::{
    extract::State,
    http::{header::HOST, HeaderMap},
    Json,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Ed25519 public key as a JSON Web Key.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PublicKeyJwk {
    pub kty: String,
    pub crv: String,
    /// Base64url public key bytes.
    pub x: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub controller: String,
    pub public_key_jwk: PublicKeyJwk,
}

/// DID document served at `/.well-known/did.json`.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    pub verification_method: Vec<VerificationMethod>,
    pub authentication: Vec<String>,
    pub assertion_method: Vec<String>,
}

/// Health check endpoint handler.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: state.service.name.clone(),
        version: state.service.version.clone(),
    })
}

/// Serve the service's DID document.
///
/// The DID is `did:web:<domain>` where the domain is `DID_WEB_DOMAIN` or,
/// when unset, the request host without its port.
#[utoipa::path(
    get,
    path = "/.well-known/did.json",
    tag = "Health",
    responses(
        (status = 200, description = "DID document", body = DidDocument)
    )
)]
pub async fn did_document(State(state): State<AppState>, headers: HeaderMap) -> Json<DidDocument> {
    let domain = state
        .service
        .did_web_domain
        .clone()
        .unwrap_or_else(|| request_host(&headers));

    let did = format!("did:web:{domain}");
    let key_id = format!("{did}#key-1");
    let public_key = state.credentials.signer().public_key();

    Json(DidDocument {
        context: vec![DID_CONTEXT.to_string()],
        id: did.clone(),
        verification_method: vec![VerificationMethod {
            id: key_id.clone(),
            method_type: "Ed25519VerificationKey2020".to_string(),
            controller: did,
            public_key_jwk: PublicKeyJwk {
                kty: "OKP".to_string(),
                crv: "Ed25519".to_string(),
                x: Base64UrlUnpadded::encode_string(&public_key),
            },
        }],
        authentication: vec![key_id.clone()],
        assertion_method: vec![key_id],
    })
}

fn request_host(headers: &HeaderMap) -> String {
    headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(':').next())
        .filter(|h| !h.is_empty())
        .unwrap_or("localhost")
        .to_string()
}
