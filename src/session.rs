// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory sign-in sessions.
//!
//! A session ties a verified Farcaster identity to its bound account and mint
//! controller. Nothing is persisted: sessions end on sign-out, on expiry, or
//! when the process restarts.

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::Address;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::hub::FarcasterProfile;
use crate::mint::MintController;
use crate::siwf::{user_id, SESSION_TTL_SECS};
use crate::wallet::BoundAccount;

/// Farcaster identity established by a successful sign-in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub fid: u64,
    pub username: Option<String>,
    pub pfp: Option<String>,
    pub addresses: Vec<Address>,
    /// Where the user last asked the NFT to be sent.
    pub preferred_address: Option<Address>,
}

impl VerifiedIdentity {
    pub fn new(fid: u64) -> Self {
        Self {
            fid,
            ..Default::default()
        }
    }

    /// Overwrite display data with a fresh hub profile.
    pub fn merge_profile(&mut self, profile: &FarcasterProfile) {
        if profile.username.is_some() {
            self.username = profile.username.clone();
        }
        if profile.pfp.is_some() {
            self.pfp = profile.pfp.clone();
        }
        self.addresses = profile.addresses.clone();
    }
}

#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub identity: RwLock<VerifiedIdentity>,
    pub account: Arc<BoundAccount>,
    pub mint: Arc<MintController>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(identity: VerifiedIdentity, account: BoundAccount, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity: RwLock::new(identity),
            account: Arc::new(account),
            mint: Arc::new(MintController::new()),
            expires_at: now + Duration::seconds(SESSION_TTL_SECS),
        }
    }

    pub async fn user_id(&self) -> String {
        user_id(self.identity.read().await.fid)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Live sessions keyed by id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Session) -> Arc<Session> {
        self.insert_at(session, Utc::now()).await
    }

    /// Store `session`, dropping every session already expired at `now`.
    ///
    /// Sessions that are never read again are reclaimed here, so the map
    /// only ever holds live sign-ins plus those expired since the last one.
    pub async fn insert_at(&self, session: Session, now: DateTime<Utc>) -> Arc<Session> {
        let session = Arc::new(session);
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, existing| !existing.is_expired(now));
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, "Evicted expired sessions");
        }
        sessions.insert(session.id, session.clone());
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        self.get_at(id, Utc::now()).await
    }

    /// Live session by id; an expired one is evicted and reported missing.
    pub async fn get_at(&self, id: Uuid, now: DateTime<Utc>) -> Option<Arc<Session>> {
        let session = self.sessions.read().await.get(&id).cloned()?;
        if !session.is_expired(now) {
            return Some(session);
        }

        self.sessions.write().await.remove(&id);
        tracing::info!(session_id = %id, "Evicted expired session");
        None
    }

    pub async fn remove(&self, id: Uuid) -> Option<Arc<Session>> {
        self.sessions.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::derive_personal_signer;

    fn session(now: DateTime<Utc>) -> Session {
        let account = BoundAccount::Personal {
            signer: derive_personal_signer(b"key", "siwf-42").unwrap(),
        };
        Session::new(VerifiedIdentity::new(42), account, now)
    }

    #[tokio::test]
    async fn insert_get_remove() {
        let store = SessionStore::new();
        let stored = store.insert(session(Utc::now())).await;

        let found = store.get(stored.id).await.unwrap();
        assert_eq!(found.user_id().await, "siwf-42");
        assert!(store.remove(stored.id).await.is_some());
        assert!(store.get(stored.id).await.is_none());
        assert!(store.remove(stored.id).await.is_none());
    }

    #[tokio::test]
    async fn expired_sessions_are_evicted_on_access() {
        let store = SessionStore::new();
        let created = Utc::now();
        let stored = store.insert(session(created)).await;
        assert_eq!(
            stored.expires_at - created,
            Duration::seconds(SESSION_TTL_SECS)
        );

        let later = stored.expires_at + Duration::seconds(1);
        assert!(store.get_at(stored.id, later).await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn insert_sweeps_unread_expired_sessions() {
        let store = SessionStore::new();
        let now = Utc::now();
        let long_ago = now - Duration::days(60);
        for _ in 0..50 {
            store.insert_at(session(long_ago), long_ago).await;
        }
        assert_eq!(store.len().await, 50);

        let live = store.insert_at(session(now), now).await;
        assert_eq!(store.len().await, 1);
        assert!(store.get_at(live.id, now).await.is_some());
    }

    #[test]
    fn profile_merge_keeps_known_fields() {
        let mut identity = VerifiedIdentity {
            fid: 42,
            username: Some("alice".into()),
            pfp: Some("https://old.example/pfp.png".into()),
            addresses: Vec::new(),
            preferred_address: None,
        };
        let verified: Address = "0x8773442740C17C9d0F0B87022c722F9a136206eD".parse().unwrap();

        identity.merge_profile(&FarcasterProfile {
            fid: 42,
            username: None,
            pfp: Some("https://new.example/pfp.png".into()),
            addresses: vec![verified],
        });

        assert_eq!(identity.username.as_deref(), Some("alice"));
        assert_eq!(identity.pfp.as_deref(), Some("https://new.example/pfp.png"));
        assert_eq!(identity.addresses, vec![verified]);
    }
}
