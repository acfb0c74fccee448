// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tracing_subscriber::EnvFilter;

use siwf_mint_server::{
    api::router,
    blockchain::EvmGateway,
    config::{AppConfig, ConfigError, LogFormat, DEFAULT_LOG_FILTER},
    hub::{HubClient, HubError},
    siwf::SiwfVerifier,
    state::AppState,
};

/// Time in-flight requests get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("Failed to install rustls crypto provider")]
    CryptoProvider,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Hub(#[from] HubError),

    #[error("Failed to load TLS certificate: {0}")]
    Tls(std::io::Error),

    #[error("Server failed: {0}")]
    Serve(std::io::Error),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!(error = %e, "Startup failed");
        eprintln!("siwf-mint-server: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| StartupError::CryptoProvider)?;

    let config = AppConfig::from_env();
    init_tracing(
        config
            .as_ref()
            .map(|c| c.log_format)
            .unwrap_or(LogFormat::Pretty),
    );
    let config = config?;

    let chain = Arc::new(EvmGateway::new(&config));
    let verifier = Arc::new(SiwfVerifier::new(config.siwf_domain.clone(), chain.clone()));
    let hub = HubClient::new(config.hub_url.clone())?;

    let addr = config.bind_addr;
    let tls = config.tls.clone();
    tracing::info!(
        domain = %config.siwf_domain,
        chain_id = config.chain_id,
        nft = %config.nft_address,
        smart_wallet = config.smart_wallet,
        "Configuration loaded"
    );

    let app = router(AppState::new(config, chain, verifier, hub));

    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        if wait_for_ctrl_c().await {
            shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
        }
    });

    match tls {
        Some(paths) => {
            let tls_config = RustlsConfig::from_pem_file(&paths.cert, &paths.key)
                .await
                .map_err(StartupError::Tls)?;
            tracing::info!(%addr, "SIWF mint server listening on https (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .map_err(StartupError::Serve)
        }
        None => {
            tracing::info!(%addr, "SIWF mint server listening on http (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .map_err(StartupError::Serve)
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn wait_for_ctrl_c() -> bool {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Shutdown signal received");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            false
        }
    }
}
