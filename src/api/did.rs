// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! DID challenge/response authentication.
//!
//! The service hands out single-use random challenges that expire after five
//! minutes. Verification consumes the challenge; the signature itself is
//! accepted without cryptographic checking.

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{
    error::{ApiError, ApiJson},
    models::{non_empty, ChallengeResponse, VerifyDidRequest, VerifyDidResponse},
    state::AppState,
    storage::ChallengeRejection,
};

/// Issue a new challenge.
#[utoipa::path(
    post,
    path = "/did/challenge",
    tag = "DID",
    responses(
        (status = 200, description = "Challenge issued", body = ChallengeResponse)
    )
)]
pub async fn create_challenge(
    State(state): State<AppState>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let challenge = state.challenges.issue(Utc::now())?;
    Ok(Json(ChallengeResponse {
        challenge: challenge.value,
        expires: challenge.expires_at,
    }))
}

/// Answer a challenge for a DID.
#[utoipa::path(
    post,
    path = "/did/verify",
    tag = "DID",
    request_body = VerifyDidRequest,
    responses(
        (status = 200, description = "DID verified", body = VerifyDidResponse),
        (status = 400, description = "Missing fields, or unknown, used or expired challenge")
    )
)]
pub async fn verify_did(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyDidRequest>,
) -> Result<Json<VerifyDidResponse>, ApiError> {
    let (Some(did), Some(challenge), Some(_signature)) = (
        non_empty(&request.did),
        non_empty(&request.challenge),
        non_empty(&request.signature),
    ) else {
        return Err(ApiError::bad_request(
            "did/missing-parameters",
            "DID, challenge, and signature are required",
        ));
    };

    if let Err(rejection) = state.challenges.consume(challenge, Utc::now())? {
        tracing::info!(did, reason = %rejection, "DID verification rejected");
        let message = match rejection {
            ChallengeRejection::Unknown => "Challenge is unknown or has already been used",
            ChallengeRejection::Expired => "Challenge has expired",
        };
        return Err(ApiError::bad_request("did/invalid-challenge", message));
    }

    Ok(Json(VerifyDidResponse {
        verified: true,
        did: did.to_string(),
    }))
}
