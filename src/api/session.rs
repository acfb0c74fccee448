// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session API endpoints.
//!
//! Signing in verifies the SIWF payload, binds a wallet and opens a session.
//! Mint and transfer requests only start the background submission; progress
//! is read back through the session view.

use std::sync::Arc;

use alloy::primitives::Address;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::ApiError,
    mint::{spawn_mint, spawn_transfer, MintError},
    models::{
        address_strings, CreateSessionRequest, MintStatusResponse, ProfileResponse,
        SessionResponse, TransferRequest,
    },
    session::{Session, VerifiedIdentity},
    siwf::{user_id, VerifyOutcome},
    state::AppState,
};

pub const SIGN_IN_REJECTED_MESSAGE: &str = "Sign in could not be verified";
pub const PROFILE_LOOKUP_FAILED_MESSAGE: &str = "Profile lookup failed";
pub const UNVERIFIED_RECIPIENT_MESSAGE: &str = "Recipient is not a verified address";

async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<Session>, ApiError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::not_found("Session not found"))
}

async fn session_view(state: &AppState, session: &Session) -> SessionResponse {
    let identity = session.identity.read().await;
    let account = &session.account;
    SessionResponse {
        session_id: session.id,
        user_id: user_id(identity.fid),
        fid: identity.fid,
        username: identity.username.clone(),
        pfp: identity.pfp.clone(),
        account_address: account.address().to_string(),
        admin_address: account
            .is_smart()
            .then(|| account.signer_address().to_string()),
        preferred_address: identity.preferred_address.map(|a| a.to_string()),
        expires_at: session.expires_at,
        mint: MintStatusResponse::from_progress(&session.mint.snapshot(), &state.config),
    }
}

fn mint_error(err: MintError) -> ApiError {
    match err {
        MintError::Chain(e) => ApiError::internal(e),
        other => ApiError::conflict(other.to_string()),
    }
}

/// Sign in with a verified SIWF payload.
///
/// Binding the wallet is part of signing in: if it fails, no session is
/// created.
#[utoipa::path(
    post,
    path = "/api/session",
    tag = "Sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Signed in", body = SessionResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Sign in could not be verified"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let payload: CreateSessionRequest =
        serde_json::from_slice(&body).map_err(|_| ApiError::invalid_request())?;
    let request = payload
        .sign_in_request()
        .ok_or_else(ApiError::invalid_request)?;

    let fid = match state
        .verifier
        .verify(&request)
        .await
        .map_err(ApiError::internal)?
    {
        VerifyOutcome::Verified { fid, .. } => fid,
        VerifyOutcome::Rejected(reason) => {
            tracing::info!(reason = %reason, "Session sign-in rejected");
            return Err(ApiError::unauthorized(SIGN_IN_REJECTED_MESSAGE));
        }
    };
    if payload.fid.is_some_and(|claimed| claimed != fid) {
        tracing::warn!(claimed = ?payload.fid, fid, "Client fid differs from verified fid");
    }

    let user_id = user_id(fid);
    let account = state
        .wallets
        .bind(&user_id, &request.signature, state.chain.as_ref())
        .await
        .map_err(ApiError::internal)?;

    let identity = VerifiedIdentity {
        username: payload.username,
        pfp: payload.pfp_url,
        ..VerifiedIdentity::new(fid)
    };
    let session = state
        .sessions
        .insert(Session::new(identity, account, Utc::now()))
        .await;

    tracing::info!(
        session_id = %session.id,
        user_id = %user_id,
        account = %session.account.address(),
        "Session created"
    );

    Ok((StatusCode::CREATED, Json(session_view(&state, &session).await)))
}

/// Current session view.
#[utoipa::path(
    get,
    path = "/api/session/{id}",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session", body = SessionResponse),
        (status = 404, description = "Session not found or expired")
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = find_session(&state, id).await?;
    Ok(Json(session_view(&state, &session).await))
}

/// Sign out.
#[utoipa::path(
    delete,
    path = "/api/session/{id}",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 204, description = "Signed out"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .sessions
        .remove(id)
        .await
        .ok_or_else(|| ApiError::not_found("Session not found"))?;
    tracing::info!(session_id = %id, "Session closed");
    Ok(StatusCode::NO_CONTENT)
}

/// Farcaster profile of the signed-in user.
///
/// Fetched from the hub and merged into the session identity.
#[utoipa::path(
    get,
    path = "/api/session/{id}/profile",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 404, description = "Session not found or expired"),
        (status = 502, description = "Profile lookup failed")
    )
)]
pub async fn session_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let session = find_session(&state, id).await?;
    let fid = session.identity.read().await.fid;

    let profile = state.hub.profile(fid).await.map_err(|e| {
        tracing::error!(fid, error = %e, "Hub profile lookup failed");
        ApiError::bad_gateway(PROFILE_LOOKUP_FAILED_MESSAGE)
    })?;

    let mut identity = session.identity.write().await;
    identity.merge_profile(&profile);

    Ok(Json(ProfileResponse {
        fid,
        username: identity.username.clone(),
        pfp: identity.pfp.clone(),
        verified_addresses: address_strings(&identity.addresses),
        preferred_address: identity.preferred_address.map(|a| a.to_string()),
    }))
}

/// Start minting the NFT to the session's account.
#[utoipa::path(
    post,
    path = "/api/session/{id}/mint",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 202, description = "Mint submitted", body = MintStatusResponse),
        (status = 404, description = "Session not found or expired"),
        (status = 409, description = "A mint is in flight or already done")
    )
)]
pub async fn mint(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<MintStatusResponse>), ApiError> {
    let session = find_session(&state, id).await?;

    spawn_mint(
        session.mint.clone(),
        state.chain.clone(),
        session.account.clone(),
    )
    .map_err(mint_error)?;
    tracing::info!(session_id = %id, account = %session.account.address(), "Mint started");

    let status = MintStatusResponse::from_progress(&session.mint.snapshot(), &state.config);
    Ok((StatusCode::ACCEPTED, Json(status)))
}

/// Transfer the minted NFT to another address.
#[utoipa::path(
    post,
    path = "/api/session/{id}/transfer",
    tag = "Sessions",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = TransferRequest,
    responses(
        (status = 202, description = "Transfer submitted", body = MintStatusResponse),
        (status = 400, description = "Invalid or unverified recipient"),
        (status = 404, description = "Session not found or expired"),
        (status = 409, description = "Nothing transferable")
    )
)]
pub async fn transfer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<(StatusCode, Json<MintStatusResponse>), ApiError> {
    let request: TransferRequest =
        serde_json::from_slice(&body).map_err(|_| ApiError::invalid_request())?;
    let recipient: Address = request
        .recipient
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid recipient address"))?;

    let session = find_session(&state, id).await?;
    // Once the hub profile is known, only its verified addresses qualify.
    let mut identity = session.identity.write().await;
    if !identity.addresses.is_empty() && !identity.addresses.contains(&recipient) {
        return Err(ApiError::bad_request(UNVERIFIED_RECIPIENT_MESSAGE));
    }
    spawn_transfer(
        session.mint.clone(),
        state.chain.clone(),
        session.account.clone(),
        recipient,
    )
    .map_err(mint_error)?;
    identity.preferred_address = Some(recipient);
    drop(identity);
    tracing::info!(session_id = %id, recipient = %recipient, "Transfer started");

    let status = MintStatusResponse::from_progress(&session.mint.snapshot(), &state.config);
    Ok((StatusCode::ACCEPTED, Json(status)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::MockChain;
    use crate::hub::FarcasterProfile;
    use crate::mint::MintState;
    use crate::siwf::verify::tests::StubVerifier;
    use crate::siwf::SignInRequest;
    use crate::state::tests::test_state;
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    const RECIPIENT: &str = "0x8773442740C17C9d0F0B87022c722F9a136206eD";

    fn accepted() -> SignInRequest {
        SignInRequest {
            signature: "0xabc".into(),
            message: "msg".into(),
            nonce: "n1".into(),
        }
    }

    fn sign_in_body(nonce: &str) -> Bytes {
        Bytes::from(
            json!({
                "signature": "0xabc",
                "message": "msg",
                "nonce": nonce,
                "fid": 42,
                "username": "alice",
                "pfpUrl": "https://i.imgur.com/a.png"
            })
            .to_string(),
        )
    }

    fn setup() -> (AppState, Arc<MockChain>) {
        let chain = Arc::new(MockChain::default());
        let state = test_state(chain.clone(), StubVerifier::accepting(accepted(), 42));
        (state, chain)
    }

    async fn signed_in(state: &AppState) -> SessionResponse {
        let (status, Json(view)) = create_session(State(state.clone()), sign_in_body("n1"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        view
    }

    async fn settle(state: &AppState, id: Uuid) -> MintState {
        for _ in 0..100 {
            let current = state.sessions.get(id).await.unwrap().mint.state();
            if !current.is_in_flight() {
                return current;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("mint did not settle");
    }

    #[tokio::test]
    async fn sign_in_binds_smart_wallet() {
        let (state, _) = setup();
        let view = signed_in(&state).await;

        assert_eq!(view.user_id, "siwf-42");
        assert_eq!(view.fid, 42);
        assert_eq!(view.username.as_deref(), Some("alice"));
        assert!(view.admin_address.is_some());
        assert_ne!(view.admin_address.as_deref(), Some(view.account_address.as_str()));
        assert_eq!(view.mint.state, MintState::None);

        let Json(fetched) = get_session(State(state), Path(view.session_id)).await.unwrap();
        assert_eq!(fetched.account_address, view.account_address);
    }

    #[tokio::test]
    async fn rejected_sign_in_is_unauthorized() {
        let (state, _) = setup();
        let err = create_session(State(state.clone()), sign_in_body("wrong"))
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, SIGN_IN_REJECTED_MESSAGE);
        assert_eq!(state.sessions.len().await, 0);
    }

    #[tokio::test]
    async fn missing_fields_are_invalid_request() {
        let (state, _) = setup();
        let err = create_session(
            State(state),
            Bytes::from(json!({ "message": "msg", "nonce": "n1" }).to_string()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn bind_failure_creates_no_session() {
        let (state, chain) = setup();
        chain.fail_factory.store(true, Ordering::SeqCst);

        let err = create_session(State(state.clone()), sign_in_body("n1"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");
        assert_eq!(state.sessions.len().await, 0);
    }

    #[tokio::test]
    async fn sign_out_removes_session() {
        let (state, _) = setup();
        let view = signed_in(&state).await;

        let status = delete_session(State(state.clone()), Path(view.session_id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = get_session(State(state.clone()), Path(view.session_id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        let err = delete_session(State(state), Path(view.session_id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn double_mint_submits_one_claim() {
        let (state, chain) = setup();
        *chain.claim_delay.lock().unwrap() = Some(Duration::from_millis(20));
        let view = signed_in(&state).await;

        let (status, Json(first)) = mint(State(state.clone()), Path(view.session_id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(first.state, MintState::Minting);

        let err = mint(State(state.clone()), Path(view.session_id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        assert_eq!(settle(&state, view.session_id).await, MintState::Minted);
        assert_eq!(chain.claim_count(), 1);
    }

    #[tokio::test]
    async fn retry_after_failed_mint() {
        let (state, chain) = setup();
        chain.failing_claims.store(1, Ordering::SeqCst);
        let view = signed_in(&state).await;

        mint(State(state.clone()), Path(view.session_id)).await.unwrap();
        assert_eq!(settle(&state, view.session_id).await, MintState::Error);

        let (_, Json(retry)) = mint(State(state.clone()), Path(view.session_id))
            .await
            .unwrap();
        assert_eq!(retry.state, MintState::Minting);
        assert_eq!(settle(&state, view.session_id).await, MintState::Minted);

        let claims = chain.claims.lock().unwrap();
        assert_eq!(claims.len(), 2);
        assert!(claims
            .iter()
            .all(|(account, _)| account.to_string() == view.account_address));
    }

    #[tokio::test]
    async fn transfer_after_mint_records_preferred_address() {
        let (state, chain) = setup();
        let view = signed_in(&state).await;

        let err = transfer(
            State(state.clone()),
            Path(view.session_id),
            Bytes::from(json!({ "recipient": RECIPIENT }).to_string()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        mint(State(state.clone()), Path(view.session_id)).await.unwrap();
        assert_eq!(settle(&state, view.session_id).await, MintState::Minted);

        let err = transfer(
            State(state.clone()),
            Path(view.session_id),
            Bytes::from(json!({ "recipient": "0x1234" }).to_string()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let (status, _) = transfer(
            State(state.clone()),
            Path(view.session_id),
            Bytes::from(json!({ "recipient": RECIPIENT }).to_string()),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(settle(&state, view.session_id).await, MintState::Transferred);
        assert_eq!(chain.transfer_count(), 1);

        let Json(after) = get_session(State(state), Path(view.session_id)).await.unwrap();
        let recipient: Address = RECIPIENT.parse().unwrap();
        assert_eq!(after.preferred_address, Some(recipient.to_string()));
        assert_eq!(after.mint.recipient, Some(recipient.to_string()));
        assert!(after.mint.mint_tx.is_some());
        assert!(after
            .mint
            .transfer_tx
            .unwrap()
            .explorer_url
            .starts_with("https://etherscan.io/tx/0x"));
    }

    #[tokio::test]
    async fn profile_merges_hub_data() {
        let (state, _) = setup();
        let view = signed_in(&state).await;
        let verified: Address = RECIPIENT.parse().unwrap();
        state.hub.cache().put(FarcasterProfile {
            fid: 42,
            username: Some("alice.eth".into()),
            pfp: None,
            addresses: vec![verified],
        });

        let Json(profile) = session_profile(State(state.clone()), Path(view.session_id))
            .await
            .unwrap();
        assert_eq!(profile.username.as_deref(), Some("alice.eth"));
        assert_eq!(profile.pfp.as_deref(), Some("https://i.imgur.com/a.png"));
        assert_eq!(profile.verified_addresses, vec![verified.to_string()]);
    }

    #[tokio::test]
    async fn transfer_is_limited_to_verified_addresses_once_known() {
        let (state, chain) = setup();
        let view = signed_in(&state).await;
        let verified: Address = RECIPIENT.parse().unwrap();
        state.hub.cache().put(FarcasterProfile {
            fid: 42,
            username: None,
            pfp: None,
            addresses: vec![verified],
        });
        session_profile(State(state.clone()), Path(view.session_id))
            .await
            .unwrap();
        mint(State(state.clone()), Path(view.session_id)).await.unwrap();
        assert_eq!(settle(&state, view.session_id).await, MintState::Minted);

        let err = transfer(
            State(state.clone()),
            Path(view.session_id),
            Bytes::from(
                json!({ "recipient": "0x000000000000000000000000000000000000dEaD" }).to_string(),
            ),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, UNVERIFIED_RECIPIENT_MESSAGE);
        assert_eq!(
            state.sessions.get(view.session_id).await.unwrap().mint.state(),
            MintState::Minted
        );

        let (status, _) = transfer(
            State(state.clone()),
            Path(view.session_id),
            Bytes::from(json!({ "recipient": RECIPIENT }).to_string()),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(settle(&state, view.session_id).await, MintState::Transferred);
        assert_eq!(chain.transfers.lock().unwrap()[0].1, verified);
    }

    #[tokio::test]
    async fn unreachable_hub_is_bad_gateway() {
        let (state, _) = setup();
        let view = signed_in(&state).await;

        let err = session_profile(State(state), Path(view.session_id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.message, PROFILE_LOOKUP_FAILED_MESSAGE);
    }
}
