// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-in verification.
//!
//! A message is verified when all of the following hold:
//! 1. It parses and is scoped to the configured domain and submitted nonce.
//! 2. It is a Farcaster message (statement, version, OP Mainnet chain id,
//!    `farcaster://fid/` resource) inside its validity window.
//! 3. The signature recovers to the message address, or the address is a
//!    contract accepting it under ERC-1271.
//! 4. The IdRegistry lists the message address as custodian of the fid.
//!
//! Failing any check is a negative [`VerifyOutcome`]; only infrastructure
//! failures are errors.

use std::sync::Arc;

use alloy::primitives::{eip191_hash_message, Address, Signature, B256};
use chrono::{DateTime, Utc};

use super::message::SiwfMessage;
use crate::blockchain::{BoxFuture, ChainError, ChainGateway, OPTIMISM_CHAIN_ID};

pub const FARCASTER_STATEMENT: &str = "Farcaster Auth";

/// Signed sign-in triple as submitted by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInRequest {
    pub message: String,
    pub signature: String,
    pub nonce: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified { fid: u64, custody: Address },
    Rejected(RejectReason),
}

/// Why a syntactically complete sign-in was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("message could not be parsed: {0}")]
    Malformed(String),
    #[error("domain mismatch (expected {expected}, got {actual})")]
    DomainMismatch { expected: String, actual: String },
    #[error("nonce mismatch")]
    NonceMismatch,
    #[error("not a Farcaster sign-in message: {0}")]
    NotFarcaster(&'static str),
    #[error("message expired")]
    Expired,
    #[error("message not yet valid")]
    NotYetValid,
    #[error("signature is not valid hex")]
    InvalidSignature,
    #[error("signature does not match message address")]
    SignerMismatch,
    #[error("address is not the custodian of fid {0}")]
    NotCustodian(u64),
}

/// Seam between the HTTP layer and sign-in verification.
pub trait SignInVerifier: Send + Sync {
    fn verify<'a>(
        &'a self,
        request: &'a SignInRequest,
    ) -> BoxFuture<'a, Result<VerifyOutcome, ChainError>>;
}

/// Verifies sign-in messages for one domain.
#[derive(Clone)]
pub struct SiwfVerifier {
    domain: String,
    chain: Arc<dyn ChainGateway>,
}

impl SiwfVerifier {
    pub fn new(domain: impl Into<String>, chain: Arc<dyn ChainGateway>) -> Self {
        Self {
            domain: domain.into(),
            chain,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub async fn verify_at(
        &self,
        request: &SignInRequest,
        now: DateTime<Utc>,
    ) -> Result<VerifyOutcome, ChainError> {
        let message = match request.message.parse::<SiwfMessage>() {
            Ok(message) => message,
            Err(e) => return Ok(reject(RejectReason::Malformed(e.to_string()))),
        };

        let fid = match self.check_claims(&message, &request.nonce, now) {
            Ok(fid) => fid,
            Err(reason) => return Ok(reject(reason)),
        };

        let Ok(signature) = alloy::hex::decode(&request.signature) else {
            return Ok(reject(RejectReason::InvalidSignature));
        };
        let hash = eip191_hash_message(request.message.as_bytes());
        // Contract wallets may sign with any byte layout; only 65-byte
        // signatures are tried as ECDSA.
        if recover_signer(&signature, &hash) != Some(message.address)
            && !self
                .chain
                .is_valid_signature(message.address, hash, &signature)
                .await?
        {
            return Ok(reject(RejectReason::SignerMismatch));
        }

        let custody = self.chain.custody_of(fid).await?;
        if custody != message.address {
            return Ok(reject(RejectReason::NotCustodian(fid)));
        }

        Ok(VerifyOutcome::Verified { fid, custody })
    }

    /// Message checks that need no signature or chain access.
    fn check_claims(
        &self,
        message: &SiwfMessage,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, RejectReason> {
        if message.domain != self.domain {
            return Err(RejectReason::DomainMismatch {
                expected: self.domain.clone(),
                actual: message.domain.clone(),
            });
        }
        if message.nonce != nonce {
            return Err(RejectReason::NonceMismatch);
        }
        if message.statement.as_deref() != Some(FARCASTER_STATEMENT) {
            return Err(RejectReason::NotFarcaster("statement"));
        }
        if message.version != "1" {
            return Err(RejectReason::NotFarcaster("version"));
        }
        if message.chain_id != OPTIMISM_CHAIN_ID {
            return Err(RejectReason::NotFarcaster("chain id"));
        }
        if message.expiration_time.is_some_and(|exp| exp <= now) {
            return Err(RejectReason::Expired);
        }
        if message.not_before.is_some_and(|nbf| nbf > now) {
            return Err(RejectReason::NotYetValid);
        }
        message.fid().ok_or(RejectReason::NotFarcaster("fid resource"))
    }
}

impl SignInVerifier for SiwfVerifier {
    fn verify<'a>(
        &'a self,
        request: &'a SignInRequest,
    ) -> BoxFuture<'a, Result<VerifyOutcome, ChainError>> {
        Box::pin(self.verify_at(request, Utc::now()))
    }
}

fn reject(reason: RejectReason) -> VerifyOutcome {
    tracing::debug!(reason = %reason, "Sign-in rejected");
    VerifyOutcome::Rejected(reason)
}

fn recover_signer(signature: &[u8], hash: &B256) -> Option<Address> {
    Signature::from_raw(signature)
        .ok()?
        .recover_address_from_prehash(hash)
        .ok()
}
