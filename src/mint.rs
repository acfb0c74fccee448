// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Mint / transfer status machine
//!
//! ```text
//! none ──mint──▶ minting ──ok──▶ minted ──transfer──▶ transferring ──ok──▶ transferred
//!   ▲               │                                      │
//!   │               └──fail──▶ error ◀──────fail───────────┘
//!   └─── (retry: error ──mint──▶ minting)
//! ```
//!
//! Starting an operation is a synchronous check-and-set under a lock, so at
//! most one claim or transfer is ever in flight. The chain call itself runs
//! without the lock held.
//!
//! `error` keeps the hashes and token id of whatever succeeded before the
//! failure. A retry starts from a clean slate: every field except the state
//! is reset. After a failed transfer this means a retry submits a second
//! claim; the first token stays in the bound account.

use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::{ChainError, ChainGateway, MintReceipt};
use crate::wallet::BoundAccount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MintState {
    None,
    Minting,
    Error,
    Minted,
    Transferring,
    Transferred,
}

impl MintState {
    pub fn is_in_flight(self) -> bool {
        matches!(self, MintState::Minting | MintState::Transferring)
    }
}

/// Snapshot of a session's mint progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintProgress {
    pub state: MintState,
    pub mint_tx: Option<TxHash>,
    pub transfer_tx: Option<TxHash>,
    pub token_id: Option<U256>,
    pub recipient: Option<Address>,
}

impl Default for MintProgress {
    fn default() -> Self {
        Self {
            state: MintState::None,
            mint_tx: None,
            transfer_tx: None,
            token_id: None,
            recipient: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MintError {
    #[error("Cannot {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: MintState,
    },

    #[error("Token id of the minted NFT is unknown")]
    UnknownTokenId,

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Per-session mint controller.
#[derive(Debug, Default)]
pub struct MintController {
    progress: Mutex<MintProgress>,
}

impl MintController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MintProgress {
        self.lock().clone()
    }

    pub fn state(&self) -> MintState {
        self.lock().state
    }

    /// `none | error → minting`.
    pub fn begin_mint(&self) -> Result<(), MintError> {
        let mut progress = self.lock();
        match progress.state {
            MintState::None | MintState::Error => {
                *progress = MintProgress {
                    state: MintState::Minting,
                    ..MintProgress::default()
                };
                Ok(())
            }
            state => Err(MintError::InvalidTransition {
                action: "mint",
                state,
            }),
        }
    }

    /// `minting → minted | error`.
    pub fn finish_mint(&self, result: &Result<MintReceipt, ChainError>) {
        let mut progress = self.lock();
        match result {
            Ok(receipt) => {
                progress.state = MintState::Minted;
                progress.mint_tx = Some(receipt.tx_hash);
                progress.token_id = receipt.token_id;
            }
            Err(_) => progress.state = MintState::Error,
        }
    }

    /// `minted → transferring`; returns the token id to move.
    pub fn begin_transfer(&self, recipient: Address) -> Result<U256, MintError> {
        let mut progress = self.lock();
        if progress.state != MintState::Minted {
            return Err(MintError::InvalidTransition {
                action: "transfer",
                state: progress.state,
            });
        }
        let token_id = progress.token_id.ok_or(MintError::UnknownTokenId)?;
        progress.state = MintState::Transferring;
        progress.recipient = Some(recipient);
        Ok(token_id)
    }

    /// `transferring → transferred | error`.
    pub fn finish_transfer(&self, result: &Result<TxHash, ChainError>) {
        let mut progress = self.lock();
        match result {
            Ok(tx_hash) => {
                progress.state = MintState::Transferred;
                progress.transfer_tx = Some(*tx_hash);
            }
            Err(_) => progress.state = MintState::Error,
        }
    }

    /// Claim one token to the account's own address.
    pub async fn mint(
        &self,
        chain: &dyn ChainGateway,
        account: &BoundAccount,
    ) -> Result<MintReceipt, MintError> {
        self.begin_mint()?;
        Ok(self.run_mint(chain, account).await?)
    }

    pub async fn transfer(
        &self,
        chain: &dyn ChainGateway,
        account: &BoundAccount,
        recipient: Address,
    ) -> Result<TxHash, MintError> {
        let token_id = self.begin_transfer(recipient)?;
        Ok(self.run_transfer(chain, account, recipient, token_id).await?)
    }

    /// Submit the claim for a mint already begun with [`Self::begin_mint`].
    pub async fn run_mint(
        &self,
        chain: &dyn ChainGateway,
        account: &BoundAccount,
    ) -> Result<MintReceipt, ChainError> {
        let result = chain.claim_to(account, account.address()).await;
        match &result {
            Ok(receipt) => tracing::info!(
                account = %account.address(),
                tx_hash = %receipt.tx_hash,
                token_id = ?receipt.token_id,
                "Mint confirmed"
            ),
            Err(e) => tracing::error!(account = %account.address(), error = %e, "Mint failed"),
        }
        self.finish_mint(&result);
        result
    }

    /// Submit the transfer begun with [`Self::begin_transfer`].
    pub async fn run_transfer(
        &self,
        chain: &dyn ChainGateway,
        account: &BoundAccount,
        recipient: Address,
        token_id: U256,
    ) -> Result<TxHash, ChainError> {
        let result = chain.transfer_token(account, recipient, token_id).await;
        match &result {
            Ok(tx_hash) => tracing::info!(
                account = %account.address(),
                recipient = %recipient,
                tx_hash = %tx_hash,
                "Transfer confirmed"
            ),
            Err(e) => tracing::error!(account = %account.address(), error = %e, "Transfer failed"),
        }
        self.finish_transfer(&result);
        result
    }

    fn lock(&self) -> MutexGuard<'_, MintProgress> {
        // A poisoned lock still holds a consistent state value.
        self.progress
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Begin a mint and run it on a background task.
///
/// The claim is not tied to the caller: dropping the returned handle (or the
/// HTTP request that triggered it) does not abort the submission.
pub fn spawn_mint(
    controller: Arc<MintController>,
    chain: Arc<dyn ChainGateway>,
    account: Arc<BoundAccount>,
) -> Result<tokio::task::JoinHandle<()>, MintError> {
    controller.begin_mint()?;
    Ok(tokio::spawn(async move {
        let _ = controller.run_mint(chain.as_ref(), &account).await;
    }))
}

/// Begin a transfer and run it on a background task.
pub fn spawn_transfer(
    controller: Arc<MintController>,
    chain: Arc<dyn ChainGateway>,
    account: Arc<BoundAccount>,
    recipient: Address,
) -> Result<tokio::task::JoinHandle<()>, MintError> {
    let token_id = controller.begin_transfer(recipient)?;
    Ok(tokio::spawn(async move {
        let _ = controller
            .run_transfer(chain.as_ref(), &account, recipient, token_id)
            .await;
    }))
}
