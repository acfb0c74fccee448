// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign In With Farcaster verification endpoint.
//!
//! The body is read as raw bytes so that every malformed shape (non-JSON,
//! missing `payload`, payload that is not an object, missing or empty
//! fields) maps to the same 400 `Invalid request`.

use axum::{body::Bytes, extract::State, Json};
use chrono::Utc;

use crate::{
    error::ApiError,
    models::{AuthenticateRequest, AuthenticateResponse, SignInPayload},
    siwf::{user_id, SignInRequest, VerifyOutcome, SESSION_TTL_SECS},
    state::AppState,
};

/// Decode `{ "payload": "<json>" }` into a sign-in request.
pub fn parse_authenticate_body(body: &[u8]) -> Result<SignInRequest, ApiError> {
    let outer: AuthenticateRequest =
        serde_json::from_slice(body).map_err(|_| ApiError::invalid_request())?;
    let payload = outer.payload.ok_or_else(ApiError::invalid_request)?;
    let inner: SignInPayload =
        serde_json::from_str(&payload).map_err(|_| ApiError::invalid_request())?;
    inner.into_request().ok_or_else(ApiError::invalid_request)
}

/// Verify a signed SIWF message.
///
/// A negative verdict is a normal 200 response; only infrastructure failures
/// are errors.
#[utoipa::path(
    post,
    path = "/api/authenticate",
    tag = "Sign-in",
    request_body = AuthenticateRequest,
    responses(
        (status = 200, description = "Verification verdict", body = AuthenticateResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn authenticate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AuthenticateResponse>, ApiError> {
    let request = parse_authenticate_body(&body)?;

    let outcome = state
        .verifier
        .verify(&request)
        .await
        .map_err(ApiError::internal)?;

    let response = match outcome {
        VerifyOutcome::Verified { fid, .. } => {
            tracing::info!(fid, "Sign-in verified");
            AuthenticateResponse {
                user_id: Some(user_id(fid)),
                is_verified_user: true,
                exp: Some(Utc::now().timestamp() + SESSION_TTL_SECS),
            }
        }
        VerifyOutcome::Rejected(reason) => {
            tracing::info!(reason = %reason, "Sign-in not verified");
            AuthenticateResponse::unverified()
        }
    };

    Ok(Json(response))
}
