// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{body::Bytes, Json};

use crate::{
    error::ApiError,
    models::{AuthenticateResponse, UserLookupRequest},
};

/// Look up whether a fid is a verified user.
///
/// Not wired to any user store: every well-formed lookup answers
/// `isVerifiedUser: false`.
#[utoipa::path(
    get,
    path = "/api/user",
    tag = "Sign-in",
    request_body = UserLookupRequest,
    responses(
        (status = 200, description = "Lookup result", body = AuthenticateResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_user(body: Bytes) -> Result<Json<AuthenticateResponse>, ApiError> {
    let lookup: UserLookupRequest = serde_json::from_slice(&body).map_err(ApiError::internal)?;
    tracing::debug!(fid = ?lookup.fid, "User lookup");
    Ok(Json(AuthenticateResponse::unverified()))
}
