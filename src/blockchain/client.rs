// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Alloy-backed [`ChainGateway`].

use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, Bytes, TxHash, B256, U256},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
};
use url::Url;

use super::contracts::{
    claim_calldata, claimed_token_id, create_account_calldata, execute_calldata,
    transfer_calldata, IAccountFactory, IDropERC721, IERC1271, IIdRegistry,
};
use super::types::*;
use super::{BoxFuture, ChainError, ChainGateway};
use crate::config::AppConfig;
use crate::wallet::BoundAccount;

/// HTTP provider type (with all fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Gateway to the NFT chain and to the Farcaster registries on Optimism.
pub struct EvmGateway {
    nft: Address,
    factory: Address,
    chain_rpc_url: Url,
    /// Read-only provider for the NFT chain.
    chain: HttpProvider,
    /// Read-only provider for OP Mainnet.
    registry: HttpProvider,
}

impl EvmGateway {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            nft: config.nft_address,
            factory: config.factory_address,
            chain_rpc_url: config.chain_rpc_url.clone(),
            chain: ProviderBuilder::new().connect_http(config.chain_rpc_url.clone()),
            registry: ProviderBuilder::new().connect_http(config.siwf_rpc_url.clone()),
        }
    }

    /// Route `data` to `target` through the bound account.
    ///
    /// Smart accounts are deployed on first use and then driven by their
    /// admin through `execute`.
    async fn submit(
        &self,
        account: &BoundAccount,
        target: Address,
        value: U256,
        data: Bytes,
    ) -> Result<TransactionReceipt, ChainError> {
        match account {
            BoundAccount::Personal { signer } => {
                let tx = TransactionRequest::default()
                    .to(target)
                    .value(value)
                    .input(data.into());
                self.send_and_confirm(signer, tx).await
            }
            BoundAccount::Smart { admin, address } => {
                self.ensure_deployed(admin, *address).await?;
                let tx = TransactionRequest::default()
                    .to(*address)
                    .value(value)
                    .input(execute_calldata(target, value, data).into());
                self.send_and_confirm(admin, tx).await
            }
        }
    }

    async fn ensure_deployed(
        &self,
        admin: &PrivateKeySigner,
        account: Address,
    ) -> Result<(), ChainError> {
        let code = self
            .chain
            .get_code_at(account)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        if !code.is_empty() {
            return Ok(());
        }

        tracing::info!(account = %account, admin = %admin.address(), "Deploying smart account");
        let tx = TransactionRequest::default()
            .to(self.factory)
            .input(create_account_calldata(admin.address()).into());
        self.send_and_confirm(admin, tx).await?;
        Ok(())
    }

    /// Sign, broadcast and wait for the receipt of `tx`.
    async fn send_and_confirm(
        &self,
        signer: &PrivateKeySigner,
        tx: TransactionRequest,
    ) -> Result<TransactionReceipt, ChainError> {
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(self.chain_rpc_url.clone());

        let pending = provider
            .send_transaction(tx)
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("Failed to send: {e}")))?;
        let tx_hash = *pending.tx_hash();
        tracing::debug!(tx_hash = %tx_hash, from = %signer.address(), "Transaction sent");

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("Failed to confirm: {e}")))?;

        if !receipt.status() {
            return Err(ChainError::Reverted(format!("{tx_hash:#x}")));
        }

        tracing::info!(
            tx_hash = %tx_hash,
            block = receipt.block_number.unwrap_or_default(),
            "Transaction confirmed"
        );
        Ok(receipt)
    }
}

impl ChainGateway for EvmGateway {
    fn block_number(&self) -> BoxFuture<'_, Result<u64, ChainError>> {
        Box::pin(async move {
            self.chain
                .get_block_number()
                .await
                .map_err(|e| ChainError::Rpc(e.to_string()))
        })
    }

    fn custody_of(&self, fid: u64) -> BoxFuture<'_, Result<Address, ChainError>> {
        Box::pin(async move {
            IIdRegistry::new(ID_REGISTRY_ADDRESS, self.registry.clone())
                .custodyOf(U256::from(fid))
                .call()
                .await
                .map_err(|e| ChainError::Contract(e.to_string()))
        })
    }

    fn is_valid_signature<'a>(
        &'a self,
        signer: Address,
        hash: B256,
        signature: &'a [u8],
    ) -> BoxFuture<'a, Result<bool, ChainError>> {
        Box::pin(async move {
            let code = self
                .registry
                .get_code_at(signer)
                .await
                .map_err(|e| ChainError::Rpc(e.to_string()))?;
            if code.is_empty() {
                return Ok(false);
            }

            let magic = IERC1271::new(signer, self.registry.clone())
                .isValidSignature(hash, Bytes::copy_from_slice(signature))
                .call()
                .await
                .map_err(|e| ChainError::Contract(e.to_string()))?;
            Ok(magic == ERC1271_MAGIC_VALUE)
        })
    }

    fn smart_account_address(&self, admin: Address) -> BoxFuture<'_, Result<Address, ChainError>> {
        Box::pin(async move {
            IAccountFactory::new(self.factory, self.chain.clone())
                .getAddress(admin, Bytes::new())
                .call()
                .await
                .map_err(|e| ChainError::Contract(e.to_string()))
        })
    }

    fn claim_to<'a>(
        &'a self,
        account: &'a BoundAccount,
        recipient: Address,
    ) -> BoxFuture<'a, Result<MintReceipt, ChainError>> {
        Box::pin(async move {
            let drop = IDropERC721::new(self.nft, self.chain.clone());
            let condition_id = drop
                .getActiveClaimConditionId()
                .call()
                .await
                .map_err(|e| ChainError::Contract(e.to_string()))?;
            let condition = drop
                .getClaimConditionById(condition_id)
                .call()
                .await
                .map_err(|e| ChainError::Contract(e.to_string()))?;

            let (data, value) = claim_calldata(recipient, &condition);
            let receipt = self.submit(account, self.nft, value, data).await?;
            let token_id = claimed_token_id(receipt.inner.logs(), self.nft, account.address());
            if token_id.is_none() {
                tracing::warn!(
                    tx_hash = %receipt.transaction_hash,
                    "Claim confirmed without a matching TokensClaimed event"
                );
            }

            Ok(MintReceipt {
                tx_hash: receipt.transaction_hash,
                token_id,
            })
        })
    }

    fn transfer_token<'a>(
        &'a self,
        account: &'a BoundAccount,
        to: Address,
        token_id: U256,
    ) -> BoxFuture<'a, Result<TxHash, ChainError>> {
        Box::pin(async move {
            let data = transfer_calldata(account.address(), to, token_id);
            let receipt = self.submit(account, self.nft, U256::ZERO, data).await?;
            Ok(receipt.transaction_hash)
        })
    }
}
