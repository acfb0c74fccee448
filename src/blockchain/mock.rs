// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory [`ChainGateway`] for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy::primitives::{keccak256, Address, TxHash, B256, U256};

use super::{BoxFuture, ChainError, ChainGateway, MintReceipt};
use crate::wallet::BoundAccount;

#[derive(Default)]
pub(crate) struct MockChain {
    pub custody: Mutex<HashMap<u64, Address>>,
    /// Contract signers that accept any signature.
    pub contract_signers: Mutex<Vec<Address>>,
    /// `(account, recipient)` of every submitted claim.
    pub claims: Mutex<Vec<(Address, Address)>>,
    /// `(account, to, token_id)` of every submitted transfer.
    pub transfers: Mutex<Vec<(Address, Address, U256)>>,
    /// Number of upcoming claims that fail.
    pub failing_claims: AtomicUsize,
    pub fail_transfers: AtomicBool,
    pub fail_rpc: AtomicBool,
    pub fail_factory: AtomicBool,
    /// Claims confirm without a `TokensClaimed` event.
    pub omit_claim_event: AtomicBool,
    pub claim_delay: Mutex<Option<Duration>>,
    next_tx: AtomicU64,
}

impl MockChain {
    pub fn with_custody(fid: u64, custody: Address) -> Self {
        let chain = Self::default();
        chain.custody.lock().unwrap().insert(fid, custody);
        chain
    }

    pub fn claim_count(&self) -> usize {
        self.claims.lock().unwrap().len()
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers.lock().unwrap().len()
    }

    fn next_hash(&self) -> (u64, TxHash) {
        let n = self.next_tx.fetch_add(1, Ordering::SeqCst) + 1;
        (n, B256::from(U256::from(n).to_be_bytes::<32>()))
    }
}

impl ChainGateway for MockChain {
    fn block_number(&self) -> BoxFuture<'_, Result<u64, ChainError>> {
        Box::pin(async move {
            if self.fail_rpc.load(Ordering::SeqCst) {
                return Err(ChainError::Rpc("connection refused".into()));
            }
            Ok(1_000)
        })
    }

    fn custody_of(&self, fid: u64) -> BoxFuture<'_, Result<Address, ChainError>> {
        Box::pin(async move {
            if self.fail_rpc.load(Ordering::SeqCst) {
                return Err(ChainError::Rpc("connection refused".into()));
            }
            Ok(self
                .custody
                .lock()
                .unwrap()
                .get(&fid)
                .copied()
                .unwrap_or(Address::ZERO))
        })
    }

    fn is_valid_signature<'a>(
        &'a self,
        signer: Address,
        _hash: B256,
        _signature: &'a [u8],
    ) -> BoxFuture<'a, Result<bool, ChainError>> {
        Box::pin(async move { Ok(self.contract_signers.lock().unwrap().contains(&signer)) })
    }

    fn smart_account_address(&self, admin: Address) -> BoxFuture<'_, Result<Address, ChainError>> {
        Box::pin(async move {
            if self.fail_factory.load(Ordering::SeqCst) {
                return Err(ChainError::Contract("factory reverted".into()));
            }
            Ok(Address::from_word(keccak256(admin)))
        })
    }

    fn claim_to<'a>(
        &'a self,
        account: &'a BoundAccount,
        recipient: Address,
    ) -> BoxFuture<'a, Result<MintReceipt, ChainError>> {
        Box::pin(async move {
            let delay = *self.claim_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.claims
                .lock()
                .unwrap()
                .push((account.address(), recipient));

            let failing = self.failing_claims.load(Ordering::SeqCst);
            if failing > 0 {
                self.failing_claims.store(failing - 1, Ordering::SeqCst);
                return Err(ChainError::Reverted("0xdead".into()));
            }

            let (n, tx_hash) = self.next_hash();
            let token_id =
                (!self.omit_claim_event.load(Ordering::SeqCst)).then(|| U256::from(n));
            Ok(MintReceipt { tx_hash, token_id })
        })
    }

    fn transfer_token<'a>(
        &'a self,
        account: &'a BoundAccount,
        to: Address,
        token_id: U256,
    ) -> BoxFuture<'a, Result<TxHash, ChainError>> {
        Box::pin(async move {
            self.transfers
                .lock()
                .unwrap()
                .push((account.address(), to, token_id));
            if self.fail_transfers.load(Ordering::SeqCst) {
                return Err(ChainError::TransactionFailed("nonce too low".into()));
            }
            Ok(self.next_hash().1)
        })
    }
}
