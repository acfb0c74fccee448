// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration.
//!
//! Every on-chain collaborator is reached through [`ChainGateway`]:
//! - Farcaster IdRegistry custody lookups (Optimism)
//! - ERC-1271 signature checks for contract signers
//! - Smart account address resolution through the account factory
//! - Claiming and transferring the commemorative NFT
//!
//! [`EvmGateway`] is the alloy-backed implementation used in production.

use std::future::Future;
use std::pin::Pin;

use alloy::primitives::{Address, TxHash, B256, U256};

use crate::wallet::BoundAccount;

pub mod client;
pub mod contracts;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use client::EvmGateway;
pub use types::*;

/// Boxed future returned by [`ChainGateway`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// External chain operations the service depends on.
pub trait ChainGateway: Send + Sync {
    /// Latest block number of the NFT chain.
    fn block_number(&self) -> BoxFuture<'_, Result<u64, ChainError>>;

    /// Custody address registered for `fid` in the Farcaster IdRegistry.
    fn custody_of(&self, fid: u64) -> BoxFuture<'_, Result<Address, ChainError>>;

    /// Whether `signer` is a contract accepting `signature` over `hash` (ERC-1271).
    ///
    /// Returns `Ok(false)` for externally owned accounts.
    fn is_valid_signature<'a>(
        &'a self,
        signer: Address,
        hash: B256,
        signature: &'a [u8],
    ) -> BoxFuture<'a, Result<bool, ChainError>>;

    /// Counterfactual smart account address for `admin`.
    fn smart_account_address(&self, admin: Address) -> BoxFuture<'_, Result<Address, ChainError>>;

    /// Claim one token to `recipient` from `account` and wait for confirmation.
    fn claim_to<'a>(
        &'a self,
        account: &'a BoundAccount,
        recipient: Address,
    ) -> BoxFuture<'a, Result<MintReceipt, ChainError>>;

    /// Transfer `token_id` from `account` to `to` and wait for confirmation.
    fn transfer_token<'a>(
        &'a self,
        account: &'a BoundAccount,
        to: Address,
        token_id: U256,
    ) -> BoxFuture<'a, Result<TxHash, ChainError>>;
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Transaction {0} reverted")]
    Reverted(String),
}
