//! Freshness classification for cached balances.
//!
//! Reads never hide staleness: an entry is classified against a freshness
//! window at read time and the caller picks serve, revalidate or refetch.

use ninja_core::{BalanceRecord, CredentialFingerprint, TimestampMs};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Snapshot of the cache slot.
///
/// `record`, `fetched_at_millis` and `owner` are either all present or all
/// absent; the store only ever writes or clears them together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheEntry {
    pub record: Option<BalanceRecord>,
    pub fetched_at_millis: Option<TimestampMs>,
    pub owner: Option<CredentialFingerprint>,
}

impl CacheEntry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(record: BalanceRecord, owner: CredentialFingerprint, fetched_at_millis: TimestampMs) -> Self {
        Self {
            record: Some(record),
            fetched_at_millis: Some(fetched_at_millis),
            owner: Some(owner),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.record.is_none() || self.fetched_at_millis.is_none()
    }

    /// How old the entry is at `now`. Future timestamps count as age zero.
    pub fn age(&self, now: TimestampMs) -> Option<Duration> {
        let fetched_at = self.fetched_at_millis?;
        let elapsed = now.saturating_sub(fetched_at).max(0);
        Some(Duration::from_millis(elapsed as u64))
    }

    /// Classify against `window`: fresh while `now - fetched_at <= window`.
    pub fn classify(&self, now: TimestampMs, window: Duration) -> EntryFreshness {
        if self.record.is_none() {
            return EntryFreshness::Missing;
        }
        match self.age(now) {
            None => EntryFreshness::Missing,
            Some(age) if age <= window => EntryFreshness::Fresh { age },
            Some(age) => EntryFreshness::Stale { age },
        }
    }

    /// Apply the cache scope: the entry as the given credentials may see it.
    ///
    /// Returns `None` when the entry is empty, or when it is scoped per
    /// credential and was fetched by someone else.
    pub fn visible_to(self, scope: CacheScope, fingerprint: &CredentialFingerprint) -> Option<Self> {
        if self.is_empty() {
            return None;
        }
        match scope {
            CacheScope::Shared => Some(self),
            CacheScope::PerCredential if self.owner.as_ref() == Some(fingerprint) => Some(self),
            CacheScope::PerCredential => None,
        }
    }
}

/// Read-time classification of a [`CacheEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFreshness {
    /// Nothing cached.
    Missing,
    /// Inside the freshness window; serve without fetching.
    Fresh { age: Duration },
    /// Past the window; serve and revalidate.
    Stale { age: Duration },
}

impl EntryFreshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh { .. })
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}

/// Whether the single cache slot is partitioned by credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheScope {
    /// An entry is only visible to the credentials that fetched it.
    #[default]
    PerCredential,
    /// Any binding may see any entry until it is refreshed.
    Shared,
}
