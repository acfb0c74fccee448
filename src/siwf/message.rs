// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-4361 message parsing for Sign In With Farcaster.

use std::str::FromStr;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};

const HEADER_SUFFIX: &str = " wants you to sign in with your Ethereum account:";
const FID_RESOURCE_PREFIX: &str = "farcaster://fid/";

/// A parsed sign-in message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiwfMessage {
    pub domain: String,
    pub address: Address,
    pub statement: Option<String>,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub not_before: Option<DateTime<Utc>>,
    pub request_id: Option<String>,
    pub resources: Vec<String>,
}

impl SiwfMessage {
    /// Farcaster id claimed through a `farcaster://fid/<fid>` resource.
    pub fn fid(&self) -> Option<u64> {
        self.resources
            .iter()
            .find_map(|r| r.strip_prefix(FID_RESOURCE_PREFIX))
            .and_then(|fid| fid.parse().ok())
    }
}

impl FromStr for SiwfMessage {
    type Err = SiwfMessageError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut lines = raw.lines().peekable();

        let domain = lines
            .next()
            .and_then(|l| l.strip_suffix(HEADER_SUFFIX))
            .filter(|d| !d.is_empty())
            .ok_or(SiwfMessageError::MissingHeader)?
            .to_string();

        let address_line = lines.next().ok_or(SiwfMessageError::MissingField("address"))?;
        let address = Address::from_str(address_line.trim())
            .map_err(|e| SiwfMessageError::InvalidField("address", e.to_string()))?;

        // Blank line, optional statement, blank line.
        if lines.next_if(|l| l.is_empty()).is_none() {
            return Err(SiwfMessageError::MissingField("statement separator"));
        }
        let mut statement = None;
        if let Some(line) = lines.next_if(|l| !l.contains(": ")) {
            statement = Some(line.to_string());
            lines.next_if(|l| l.is_empty());
        }

        let mut fields: Vec<(&str, &str)> = Vec::new();
        let mut resources = Vec::new();
        let mut in_resources = false;
        for line in lines {
            if in_resources {
                match line.strip_prefix("- ") {
                    Some(resource) => {
                        resources.push(resource.to_string());
                        continue;
                    }
                    None => in_resources = false,
                }
            }
            if line == "Resources:" {
                in_resources = true;
                continue;
            }
            let (key, value) = line
                .split_once(": ")
                .ok_or_else(|| SiwfMessageError::InvalidField("line", line.to_string()))?;
            fields.push((key, value));
        }

        let field = |name: &'static str| {
            fields
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        };
        let required = |name: &'static str| field(name).ok_or(SiwfMessageError::MissingField(name));
        let timestamp = |name: &'static str| -> Result<Option<DateTime<Utc>>, SiwfMessageError> {
            field(name)
                .map(|raw| {
                    DateTime::parse_from_rfc3339(&raw)
                        .map(|t| t.with_timezone(&Utc))
                        .map_err(|e| SiwfMessageError::InvalidField(name, e.to_string()))
                })
                .transpose()
        };

        let chain_id = required("Chain ID")?
            .parse()
            .map_err(|e: std::num::ParseIntError| {
                SiwfMessageError::InvalidField("Chain ID", e.to_string())
            })?;

        Ok(Self {
            domain,
            address,
            statement,
            uri: required("URI")?,
            version: required("Version")?,
            chain_id,
            nonce: required("Nonce")?,
            issued_at: timestamp("Issued At")?.ok_or(SiwfMessageError::MissingField("Issued At"))?,
            expiration_time: timestamp("Expiration Time")?,
            not_before: timestamp("Not Before")?,
            request_id: field("Request ID"),
            resources,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SiwfMessageError {
    #[error("message header is missing or malformed")]
    MissingHeader,

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("invalid {0}: {1}")]
    InvalidField(&'static str, String),
}
