// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Farcaster hub client.
//!
//! Profiles are assembled from two independent hub reads:
//! - `/v1/userDataByFid` for the username and profile picture
//! - `/v1/verificationsByFid` for verified Ethereum addresses
//!
//! Missing entries are normal; every field of a profile is optional.

use std::time::Duration;

use alloy::primitives::Address;
use serde::Deserialize;
use url::Url;

pub mod cache;

pub use cache::ProfileCache;

const USER_DATA_TYPE_USERNAME: &str = "USER_DATA_TYPE_USERNAME";
const USER_DATA_TYPE_PFP: &str = "USER_DATA_TYPE_PFP";
const MESSAGE_TYPE_VERIFICATION_ADD_ETH_ADDRESS: &str = "MESSAGE_TYPE_VERIFICATION_ADD_ETH_ADDRESS";
const PROTOCOL_ETHEREUM: &str = "PROTOCOL_ETHEREUM";

/// Hub HTTP timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Display data for a fid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FarcasterProfile {
    pub fid: u64,
    pub username: Option<String>,
    pub pfp: Option<String>,
    pub addresses: Vec<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserData {
    pub username: Option<String>,
    pub pfp: Option<String>,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct HubMessagesResponse {
    #[serde(default)]
    pub messages: Vec<HubMessage>,
}

#[derive(Debug, Deserialize)]
pub struct HubMessage {
    pub data: Option<HubMessageData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubMessageData {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub user_data_body: Option<UserDataBody>,
    pub verification_add_address_body: Option<VerificationBody>,
    /// Pre-multichain name of `verificationAddAddressBody`.
    pub verification_add_eth_address_body: Option<VerificationBody>,
}

#[derive(Debug, Deserialize)]
pub struct UserDataBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct VerificationBody {
    pub address: String,
    #[serde(default)]
    pub protocol: Option<String>,
}

// =============================================================================
// Extraction
// =============================================================================

/// Pick the username and pfp entries out of a user-data message stream.
pub fn extract_user_data(messages: &[HubMessage]) -> UserData {
    let value_of = |kind: &str| {
        messages
            .iter()
            .filter_map(|m| m.data.as_ref()?.user_data_body.as_ref())
            .find(|body| body.kind == kind)
            .map(|body| body.value.clone())
    };

    UserData {
        username: value_of(USER_DATA_TYPE_USERNAME),
        pfp: value_of(USER_DATA_TYPE_PFP),
    }
}

/// Verified Ethereum addresses from a verification message stream.
///
/// Non-Ethereum verifications and unparseable addresses are skipped.
pub fn extract_verified_addresses(messages: &[HubMessage]) -> Vec<Address> {
    let mut addresses = Vec::new();
    for data in messages.iter().filter_map(|m| m.data.as_ref()) {
        if data.kind != MESSAGE_TYPE_VERIFICATION_ADD_ETH_ADDRESS {
            continue;
        }
        let Some(body) = data
            .verification_add_address_body
            .as_ref()
            .or(data.verification_add_eth_address_body.as_ref())
        else {
            continue;
        };
        if body
            .protocol
            .as_deref()
            .is_some_and(|protocol| protocol != PROTOCOL_ETHEREUM)
        {
            continue;
        }
        if let Ok(address) = body.address.parse::<Address>() {
            if !addresses.contains(&address) {
                addresses.push(address);
            }
        }
    }
    addresses
}

// =============================================================================
// Client
// =============================================================================

/// Read client for a Farcaster hub's HTTP API.
pub struct HubClient {
    base_url: Url,
    client: reqwest::Client,
    cache: ProfileCache,
}

impl HubClient {
    pub fn new(base_url: Url) -> Result<Self, HubError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HubError::Request(e.to_string()))?;

        Ok(Self {
            base_url,
            client,
            cache: ProfileCache::default(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn cache(&self) -> &ProfileCache {
        &self.cache
    }

    /// Username, pfp and verified addresses for `fid`.
    ///
    /// Both hub reads are issued concurrently; the merged profile is cached.
    pub async fn profile(&self, fid: u64) -> Result<FarcasterProfile, HubError> {
        if let Some(profile) = self.cache.get(fid) {
            return Ok(profile);
        }

        let (user_data, addresses) =
            tokio::try_join!(self.user_data(fid), self.verified_addresses(fid))?;

        let profile = FarcasterProfile {
            fid,
            username: user_data.username,
            pfp: user_data.pfp,
            addresses,
        };
        self.cache.put(profile.clone());
        Ok(profile)
    }

    pub async fn user_data(&self, fid: u64) -> Result<UserData, HubError> {
        let messages = self.messages("userDataByFid", fid).await?;
        Ok(extract_user_data(&messages))
    }

    pub async fn verified_addresses(&self, fid: u64) -> Result<Vec<Address>, HubError> {
        let messages = self.messages("verificationsByFid", fid).await?;
        Ok(extract_verified_addresses(&messages))
    }

    async fn messages(&self, endpoint: &str, fid: u64) -> Result<Vec<HubMessage>, HubError> {
        let url = endpoint_url(&self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[("fid", fid)])
            .send()
            .await
            .map_err(|e| HubError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(HubError::Status {
                endpoint: endpoint.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body: HubMessagesResponse = response
            .json()
            .await
            .map_err(|e| HubError::Decode(e.to_string()))?;
        tracing::debug!(endpoint, fid, messages = body.messages.len(), "Hub response");
        Ok(body.messages)
    }
}

fn endpoint_url(base: &Url, endpoint: &str) -> String {
    format!("{}/v1/{endpoint}", base.as_str().trim_end_matches('/'))
}

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("Hub request failed: {0}")]
    Request(String),

    #[error("Hub returned HTTP {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("Hub response could not be decoded: {0}")]
    Decode(String),
}
