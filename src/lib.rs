// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SIWF Mint - Sign In With Farcaster NFT Claim Service
//!
//! Verifies Sign In With Farcaster messages, binds each verified identity to
//! a derived in-app (optionally smart) wallet, and drives the claim and
//! transfer of a commemorative NFT.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `blockchain` - EVM integration (IdRegistry, account factory, NFT drop)
//! - `config` - Environment configuration
//! - `hub` - Farcaster hub client
//! - `mint` - Mint / transfer status machine
//! - `session` - In-memory sign-in sessions
//! - `siwf` - SIWF message parsing and verification
//! - `wallet` - Wallet derivation and binding

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod hub;
pub mod mint;
pub mod models;
pub mod session;
pub mod siwf;
pub mod state;
pub mod wallet;
