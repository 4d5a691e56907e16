//! Profile store port
//!
//! The document store holding user profiles sits behind [`ProfileStore`];
//! the duel only ever reads a [`CombatProfile`] and writes back a
//! [`ProfileDelta`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use duel_engine::{CombatProfile, ProfileDelta};

use crate::error::{HostError, Result};

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, id: &str) -> Result<CombatProfile>;

    /// Apply a permanent attribute change. Must not be retried silently by
    /// implementations: a retry could double-apply a reward.
    async fn apply_profile_delta(&self, id: &str, delta: &ProfileDelta) -> Result<()>;
}

/// In-memory profile store for tests and local play.
///
/// Thread-safe with interior mutability using Mutex. Writes can be made to
/// fail on demand to exercise persistence error paths.
#[derive(Clone, Default)]
pub struct InMemoryProfileStore {
    profiles: Arc<Mutex<HashMap<String, CombatProfile>>>,
    /// Number of upcoming `apply_profile_delta` calls that will fail
    failures: Arc<Mutex<u32>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl Into<String>, profile: CombatProfile) {
        self.lock_profiles().insert(id.into(), profile);
    }

    /// Snapshot of a stored profile
    pub fn profile(&self, id: &str) -> Option<CombatProfile> {
        self.lock_profiles().get(id).copied()
    }

    /// Make the next `count` writes fail
    pub fn fail_next_writes(&self, count: u32) {
        *self.failures.lock().unwrap_or_else(|e| e.into_inner()) = count;
    }

    fn lock_profiles(&self) -> std::sync::MutexGuard<'_, HashMap<String, CombatProfile>> {
        self.profiles.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(&self, id: &str) -> Result<CombatProfile> {
        self.profile(id)
            .ok_or_else(|| HostError::ProfileNotFound(id.to_string()))
    }

    async fn apply_profile_delta(&self, id: &str, delta: &ProfileDelta) -> Result<()> {
        {
            let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
            if *failures > 0 {
                *failures -= 1;
                return Err(HostError::Store(format!("write to profile {} failed", id)));
            }
        }

        let mut profiles = self.lock_profiles();
        let profile = profiles
            .get_mut(id)
            .ok_or_else(|| HostError::ProfileNotFound(id.to_string()))?;
        profile.attributes = delta.apply_to(&profile.attributes);
        Ok(())
    }
}
