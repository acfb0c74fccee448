// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::blockchain::ChainGateway;
use crate::config::AppConfig;
use crate::hub::HubClient;
use crate::session::SessionStore;
use crate::siwf::SignInVerifier;
use crate::wallet::WalletBinder;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub chain: Arc<dyn ChainGateway>,
    pub verifier: Arc<dyn SignInVerifier>,
    pub wallets: Arc<WalletBinder>,
    pub hub: Arc<HubClient>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        chain: Arc<dyn ChainGateway>,
        verifier: Arc<dyn SignInVerifier>,
        hub: HubClient,
    ) -> Self {
        let wallets = WalletBinder::new(config.encryption_key.clone(), config.smart_wallet);
        Self {
            config: Arc::new(config),
            chain,
            verifier,
            wallets: Arc::new(wallets),
            hub: Arc::new(hub),
            sessions: Arc::new(SessionStore::new()),
        }
    }
}
