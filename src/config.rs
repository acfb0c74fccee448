// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! All deployment-specific values are read from the environment exactly once
//! at startup into an immutable [`AppConfig`]. A missing or malformed required
//! value aborts startup with a [`ConfigError`] naming the variable.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SIWF_DOMAIN` | Domain the SIWF message must be scoped to | Required |
//! | `THIRDWEB_CLIENT_ID` | thirdweb client id, used for default RPC URLs | Required |
//! | `NFT_CONTRACT_ADDRESS` | Drop contract the NFT is claimed from | Required |
//! | `CHAIN_ID` | Chain the NFT contract lives on | Required |
//! | `FACTORY_ADDRESS` | Smart account factory | Required |
//! | `WALLET_ENCRYPTION_KEY` | Key material for in-app wallet derivation | Optional |
//! | `SMART_WALLET` | Wrap the in-app wallet in a smart account | `true` |
//! | `BLOCK_EXPLORER_BASE_URL` | Prefix for transaction links | `https://etherscan.io/tx/` |
//! | `CHAIN_RPC_URL` | RPC endpoint of the NFT chain | thirdweb RPC for `CHAIN_ID` |
//! | `SIWF_RPC_URL` | Optimism RPC endpoint (Farcaster IdRegistry) | thirdweb RPC for chain 10 |
//! | `FARCASTER_HUB_URL` | Farcaster hub HTTP API | `https://hub.pinata.cloud` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; HTTPS when both are set | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;

use alloy::primitives::Address;
use url::Url;

use crate::blockchain::OPTIMISM_CHAIN_ID;

pub const SIWF_DOMAIN_ENV: &str = "SIWF_DOMAIN";
pub const THIRDWEB_CLIENT_ID_ENV: &str = "THIRDWEB_CLIENT_ID";
pub const NFT_CONTRACT_ADDRESS_ENV: &str = "NFT_CONTRACT_ADDRESS";
pub const CHAIN_ID_ENV: &str = "CHAIN_ID";
pub const FACTORY_ADDRESS_ENV: &str = "FACTORY_ADDRESS";
pub const WALLET_ENCRYPTION_KEY_ENV: &str = "WALLET_ENCRYPTION_KEY";
pub const SMART_WALLET_ENV: &str = "SMART_WALLET";
pub const BLOCK_EXPLORER_BASE_URL_ENV: &str = "BLOCK_EXPLORER_BASE_URL";
pub const CHAIN_RPC_URL_ENV: &str = "CHAIN_RPC_URL";
pub const SIWF_RPC_URL_ENV: &str = "SIWF_RPC_URL";
pub const FARCASTER_HUB_URL_ENV: &str = "FARCASTER_HUB_URL";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_BLOCK_EXPLORER_BASE_URL: &str = "https://etherscan.io/tx/";
pub const DEFAULT_FARCASTER_HUB_URL: &str = "https://hub.pinata.cloud";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Certificate and key used when serving HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Immutable process-wide configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub siwf_domain: String,
    pub thirdweb_client_id: String,
    pub nft_address: Address,
    pub chain_id: u64,
    pub factory_address: Address,
    pub encryption_key: Option<String>,
    pub smart_wallet: bool,
    pub explorer_base_url: String,
    pub chain_rpc_url: Url,
    pub siwf_rpc_url: Url,
    pub hub_url: Url,
    pub bind_addr: SocketAddr,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let siwf_domain = require(SIWF_DOMAIN_ENV)?;
        let thirdweb_client_id = require(THIRDWEB_CLIENT_ID_ENV)?;
        let nft_address = parse_address(NFT_CONTRACT_ADDRESS_ENV, &require(NFT_CONTRACT_ADDRESS_ENV)?)?;
        let factory_address = parse_address(FACTORY_ADDRESS_ENV, &require(FACTORY_ADDRESS_ENV)?)?;
        let chain_id: u64 = require(CHAIN_ID_ENV)?
            .parse()
            .map_err(|e| ConfigError::invalid(CHAIN_ID_ENV, e))?;

        let smart_wallet = match get(SMART_WALLET_ENV) {
            None => true,
            Some(raw) => parse_bool(SMART_WALLET_ENV, &raw)?,
        };

        let chain_rpc_url = match get(CHAIN_RPC_URL_ENV) {
            Some(raw) => parse_url(CHAIN_RPC_URL_ENV, &raw)?,
            None => parse_url(CHAIN_RPC_URL_ENV, &thirdweb_rpc_url(chain_id, &thirdweb_client_id))?,
        };
        let siwf_rpc_url = match get(SIWF_RPC_URL_ENV) {
            Some(raw) => parse_url(SIWF_RPC_URL_ENV, &raw)?,
            None => parse_url(
                SIWF_RPC_URL_ENV,
                &thirdweb_rpc_url(OPTIMISM_CHAIN_ID, &thirdweb_client_id),
            )?,
        };
        let hub_url = parse_url(
            FARCASTER_HUB_URL_ENV,
            &get(FARCASTER_HUB_URL_ENV).unwrap_or_else(|| DEFAULT_FARCASTER_HUB_URL.to_string()),
        )?;

        let host = get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = match get(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|e| ConfigError::invalid(PORT_ENV, e))?,
            None => 8080,
        };
        let bind_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| ConfigError::invalid(HOST_ENV, e))?;

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::invalid(
                    LOG_FORMAT_ENV,
                    format!("expected `json` or `pretty`, got `{other}`"),
                ))
            }
        };

        Ok(Self {
            siwf_domain,
            thirdweb_client_id,
            nft_address,
            chain_id,
            factory_address,
            encryption_key: get(WALLET_ENCRYPTION_KEY_ENV),
            smart_wallet,
            explorer_base_url: get(BLOCK_EXPLORER_BASE_URL_ENV)
                .unwrap_or_else(|| DEFAULT_BLOCK_EXPLORER_BASE_URL.to_string()),
            chain_rpc_url,
            siwf_rpc_url,
            hub_url,
            bind_addr,
            tls,
            log_format,
        })
    }

    /// Block explorer link for a transaction hash.
    pub fn explorer_link(&self, tx_hash: &str) -> String {
        format!("{}{}", self.explorer_base_url, tx_hash)
    }
}

/// thirdweb's public RPC edge for a chain.
fn thirdweb_rpc_url(chain_id: u64, client_id: &str) -> String {
    format!("https://{chain_id}.rpc.thirdweb.com/{client_id}")
}

fn parse_address(name: &'static str, raw: &str) -> Result<Address, ConfigError> {
    raw.parse().map_err(|e| ConfigError::invalid(name, e))
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::invalid(name, e))
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid(
            name,
            format!("expected a boolean, got `{other}`"),
        )),
    }
}

/// Configuration errors raised at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl ToString) -> Self {
        Self::Invalid {
            name,
            reason: reason.to_string(),
        }
    }
}
