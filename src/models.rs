// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. All types derive `ToSchema`
//! for the OpenAPI document and use camelCase field names on the wire.
//!
//! ## Model Categories
//!
//! - **Sign-in**: SIWF verification (`/api/authenticate`, `/api/user`)
//! - **Sessions**: signed-in state, bound wallet and mint status
//! - **Profiles**: Farcaster hub display data

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::mint::{MintProgress, MintState};
use crate::siwf::SignInRequest;

// =============================================================================
// Sign-in
// =============================================================================

/// Body of `POST /api/authenticate`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticateRequest {
    /// JSON-encoded [`SignInPayload`].
    pub payload: Option<String>,
}

/// Signed SIWF triple carried inside an authenticate payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SignInPayload {
    pub signature: Option<String>,
    pub message: Option<String>,
    pub nonce: Option<String>,
}

impl SignInPayload {
    /// The sign-in request, if every field is present and non-empty.
    pub fn into_request(self) -> Option<SignInRequest> {
        let present = |field: Option<String>| field.filter(|value| !value.is_empty());
        Some(SignInRequest {
            signature: present(self.signature)?,
            message: present(self.message)?,
            nonce: present(self.nonce)?,
        })
    }
}

/// Verification verdict.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateResponse {
    /// `siwf-<fid>`, only when verified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub is_verified_user: bool,
    /// Unix expiry of the granted session, only when verified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl AuthenticateResponse {
    pub fn unverified() -> Self {
        Self {
            user_id: None,
            is_verified_user: false,
            exp: None,
        }
    }
}

/// Body of `GET /api/user`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserLookupRequest {
    #[schema(value_type = Option<u64>)]
    pub fid: Option<serde_json::Value>,
}

// =============================================================================
// Sessions
// =============================================================================

/// Auth-kit status payload submitted to `POST /api/session`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub signature: Option<String>,
    pub message: Option<String>,
    pub nonce: Option<String>,
    /// Fid reported by the client; the verified fid always wins.
    pub fid: Option<u64>,
    pub username: Option<String>,
    pub pfp_url: Option<String>,
}

impl CreateSessionRequest {
    pub fn sign_in_request(&self) -> Option<SignInRequest> {
        SignInPayload {
            signature: self.signature.clone(),
            message: self.message.clone(),
            nonce: self.nonce.clone(),
        }
        .into_request()
    }
}

/// A transaction hash with its block explorer link.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub hash: String,
    pub explorer_url: String,
}

impl TransactionRecord {
    pub fn new(hash: impl ToString, config: &AppConfig) -> Self {
        let hash = hash.to_string();
        Self {
            explorer_url: config.explorer_link(&hash),
            hash,
        }
    }
}

/// Mint / transfer progress of a session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MintStatusResponse {
    pub state: MintState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mint_tx: Option<TransactionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_tx: Option<TransactionRecord>,
    /// Decimal token id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
}

impl MintStatusResponse {
    pub fn from_progress(progress: &MintProgress, config: &AppConfig) -> Self {
        Self {
            state: progress.state,
            mint_tx: progress.mint_tx.map(|tx| TransactionRecord::new(tx, config)),
            transfer_tx: progress
                .transfer_tx
                .map(|tx| TransactionRecord::new(tx, config)),
            token_id: progress.token_id.map(|id| id.to_string()),
            recipient: progress.recipient.map(|a| a.to_string()),
        }
    }
}

/// Signed-in session view.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub user_id: String,
    pub fid: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pfp: Option<String>,
    /// Address that owns the minted NFT.
    pub account_address: String,
    /// Admin key of the smart account, when one is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_address: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub mint: MintStatusResponse,
}

/// Body of `POST /api/session/{id}/transfer`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferRequest {
    /// Destination address (0x-prefixed hex).
    pub recipient: String,
}

// =============================================================================
// Profiles
// =============================================================================

/// Farcaster display data of the signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub fid: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pfp: Option<String>,
    pub verified_addresses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_address: Option<String>,
}

pub(crate) fn address_strings(addresses: &[Address]) -> Vec<String> {
    addresses.iter().map(Address::to_string).collect()
}
