// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use alloy::primitives::{address, fixed_bytes, Address, FixedBytes, TxHash, U256};

/// Chain id of OP Mainnet, where the Farcaster registries live.
pub const OPTIMISM_CHAIN_ID: u64 = 10;

/// Farcaster IdRegistry on OP Mainnet.
pub const ID_REGISTRY_ADDRESS: Address = address!("00000000fc6c5f01fc30151999387bb99a9f489b");

/// Sentinel used by drop contracts for the chain's native currency.
pub const NATIVE_TOKEN_ADDRESS: Address = address!("eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");

/// `bytes4(keccak256("isValidSignature(bytes32,bytes)"))`
pub const ERC1271_MAGIC_VALUE: FixedBytes<4> = fixed_bytes!("1626ba7e");

/// Outcome of a confirmed claim transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintReceipt {
    pub tx_hash: TxHash,
    /// First token id emitted by this transaction's `TokensClaimed` event.
    pub token_id: Option<U256>,
}
