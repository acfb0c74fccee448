// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Recently fetched hub profiles, keyed by fid.
//!
//! A profile page is usually reloaded a few times in a row, and one user may
//! hold several sessions. Serving those repeats from memory keeps the hub
//! traffic at one pair of reads per fid per freshness window.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lru::LruCache;

use super::FarcasterProfile;

/// Number of fids remembered before the least recently read one is dropped.
pub const DEFAULT_CAPACITY: usize = 1024;

/// How long a fetched profile is served without asking the hub again.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct Remembered {
    profile: FarcasterProfile,
    stale_at: Instant,
}

pub struct ProfileCache {
    profiles: Mutex<LruCache<u64, Remembered>>,
    freshness: Duration,
}

impl ProfileCache {
    /// A `capacity` of zero still remembers one profile.
    pub fn new(capacity: usize, freshness: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            profiles: Mutex::new(LruCache::new(capacity)),
            freshness,
        }
    }

    pub fn get(&self, fid: u64) -> Option<FarcasterProfile> {
        self.get_at(fid, Instant::now())
    }

    /// Profile for `fid` if it was stored less than the freshness window
    /// before `now`. A stale profile is forgotten.
    pub fn get_at(&self, fid: u64, now: Instant) -> Option<FarcasterProfile> {
        let mut profiles = self.lock();
        match profiles.get(&fid) {
            Some(remembered) if now < remembered.stale_at => Some(remembered.profile.clone()),
            Some(_) => {
                profiles.pop(&fid);
                tracing::debug!(fid, "Dropped stale hub profile");
                None
            }
            None => None,
        }
    }

    pub fn put(&self, profile: FarcasterProfile) {
        self.put_at(profile, Instant::now());
    }

    pub fn put_at(&self, profile: FarcasterProfile, now: Instant) {
        let stale_at = now + self.freshness;
        self.lock()
            .put(profile.fid, Remembered { profile, stale_at });
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<u64, Remembered>> {
        self.profiles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ProfileCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}
