// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign In With Farcaster.
//!
//! - `message` - EIP-4361 message parsing
//! - `verify` - signature, custody and claim verification

pub mod message;
pub mod verify;

pub use message::{SiwfMessage, SiwfMessageError};
pub use verify::{RejectReason, SignInRequest, SignInVerifier, SiwfVerifier, VerifyOutcome};

/// Prefix of the user id handed out for a verified fid.
pub const USER_ID_PREFIX: &str = "siwf-";

/// Session lifetime granted to a verified user (30 days).
pub const SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 30;

/// User id for a verified fid, e.g. `siwf-42`.
pub fn user_id(fid: u64) -> String {
    format!("{USER_ID_PREFIX}{fid}")
}
