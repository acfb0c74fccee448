// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet binding for verified Farcaster identities.
//!
//! The in-app (personal) key is derived deterministically:
//!
//! ```text
//! key = HMAC-SHA256(secret, "siwf-wallet:" || user_id)
//! ```
//!
//! `secret` is the configured encryption key, or the raw sign-in signature
//! when none is configured (a fresh wallet per sign-in). With smart wallets
//! enabled the personal account becomes the admin of a factory-deployed
//! smart account, and that smart account is what mints.

use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::blockchain::{ChainError, ChainGateway};

type HmacSha256 = Hmac<Sha256>;

const DERIVATION_PREFIX: &[u8] = b"siwf-wallet:";

/// Account a session transacts with.
#[derive(Debug, Clone)]
pub enum BoundAccount {
    /// Externally owned in-app account.
    Personal { signer: PrivateKeySigner },
    /// Smart account administered by an in-app signer.
    Smart {
        admin: PrivateKeySigner,
        address: Address,
    },
}

impl BoundAccount {
    /// Address that claims, owns and transfers the NFT.
    pub fn address(&self) -> Address {
        match self {
            BoundAccount::Personal { signer } => signer.address(),
            BoundAccount::Smart { address, .. } => *address,
        }
    }

    /// Address of the key that signs transactions.
    pub fn signer_address(&self) -> Address {
        match self {
            BoundAccount::Personal { signer } => signer.address(),
            BoundAccount::Smart { admin, .. } => admin.address(),
        }
    }

    pub fn is_smart(&self) -> bool {
        matches!(self, BoundAccount::Smart { .. })
    }
}

/// Where the personal key's secret comes from.
#[derive(Clone)]
pub enum KeySource {
    Configured(String),
    Signature,
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Configured(_) => f.write_str("Configured(<redacted>)"),
            KeySource::Signature => f.write_str("Signature"),
        }
    }
}

/// Binds verified identities to accounts.
#[derive(Debug, Clone)]
pub struct WalletBinder {
    key_source: KeySource,
    smart_wallet: bool,
}

impl WalletBinder {
    pub fn new(encryption_key: Option<String>, smart_wallet: bool) -> Self {
        let key_source = match encryption_key {
            Some(key) => KeySource::Configured(key),
            None => KeySource::Signature,
        };
        Self {
            key_source,
            smart_wallet,
        }
    }

    /// Derive the account for `user_id`.
    ///
    /// `signature` is the hex signature of the verified sign-in payload.
    pub async fn bind(
        &self,
        user_id: &str,
        signature: &str,
        chain: &dyn ChainGateway,
    ) -> Result<BoundAccount, WalletError> {
        let secret = match &self.key_source {
            KeySource::Configured(key) => key.as_bytes().to_vec(),
            KeySource::Signature => alloy::hex::decode(signature)
                .map_err(|e| WalletError::InvalidKeyMaterial(e.to_string()))?,
        };
        let signer = derive_personal_signer(&secret, user_id)?;

        if !self.smart_wallet {
            tracing::info!(user_id, account = %signer.address(), "Bound personal wallet");
            return Ok(BoundAccount::Personal { signer });
        }

        let address = chain.smart_account_address(signer.address()).await?;
        tracing::info!(
            user_id,
            account = %address,
            admin = %signer.address(),
            "Bound smart wallet"
        );
        Ok(BoundAccount::Smart {
            admin: signer,
            address,
        })
    }
}

/// Derive the in-app signer for `user_id` from `secret`.
pub fn derive_personal_signer(secret: &[u8], user_id: &str) -> Result<PrivateKeySigner, WalletError> {
    if secret.is_empty() {
        return Err(WalletError::InvalidKeyMaterial("empty secret".to_string()));
    }

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| WalletError::InvalidKeyMaterial(e.to_string()))?;
    mac.update(DERIVATION_PREFIX);
    mac.update(user_id.as_bytes());
    let key = mac.finalize().into_bytes();

    PrivateKeySigner::from_slice(&key).map_err(|e| WalletError::InvalidKeyMaterial(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    #[error("Smart wallet resolution failed: {0}")]
    SmartWallet(#[from] ChainError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::MockChain;
    use std::sync::atomic::Ordering;

    #[test]
    fn derivation_is_deterministic_per_user() {
        let a = derive_personal_signer(b"secret", "siwf-42").unwrap();
        let b = derive_personal_signer(b"secret", "siwf-42").unwrap();
        let other_user = derive_personal_signer(b"secret", "siwf-43").unwrap();
        let other_secret = derive_personal_signer(b"another", "siwf-42").unwrap();

        assert_eq!(a.address(), b.address());
        assert_ne!(a.address(), other_user.address());
        assert_ne!(a.address(), other_secret.address());
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            derive_personal_signer(b"", "siwf-1"),
            Err(WalletError::InvalidKeyMaterial(_))
        ));
    }

    #[tokio::test]
    async fn personal_binding_skips_factory() {
        let chain = MockChain::default();
        chain.fail_factory.store(true, Ordering::SeqCst);
        let binder = WalletBinder::new(Some("key".into()), false);

        let account = binder.bind("siwf-42", "0x00", &chain).await.unwrap();
        assert!(!account.is_smart());
        assert_eq!(account.address(), account.signer_address());
    }

    #[tokio::test]
    async fn smart_binding_uses_factory_address() {
        let chain = MockChain::default();
        let binder = WalletBinder::new(Some("key".into()), true);

        let account = binder.bind("siwf-42", "0x00", &chain).await.unwrap();
        let admin = derive_personal_signer(b"key", "siwf-42").unwrap();

        assert!(account.is_smart());
        assert_eq!(account.signer_address(), admin.address());
        assert_ne!(account.address(), admin.address());
    }

    #[tokio::test]
    async fn signature_keyed_wallets_differ_per_sign_in() {
        let chain = MockChain::default();
        let binder = WalletBinder::new(None, false);

        let first = binder.bind("siwf-42", "0xaaaa", &chain).await.unwrap();
        let second = binder.bind("siwf-42", "0xbbbb", &chain).await.unwrap();
        assert_ne!(first.address(), second.address());

        assert!(matches!(
            binder.bind("siwf-42", "not-hex", &chain).await,
            Err(WalletError::InvalidKeyMaterial(_))
        ));
    }

    #[tokio::test]
    async fn factory_failure_surfaces_as_error() {
        let chain = MockChain::default();
        chain.fail_factory.store(true, Ordering::SeqCst);
        let binder = WalletBinder::new(Some("key".into()), true);

        assert!(matches!(
            binder.bind("siwf-42", "0x00", &chain).await,
            Err(WalletError::SmartWallet(_))
        ));
    }
}
