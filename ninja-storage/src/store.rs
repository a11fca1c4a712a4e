//! The cache slot itself.

use crate::freshness::CacheEntry;
use ninja_core::{BalanceRecord, CredentialFingerprint, TimestampMs};
use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

/// Passive container for the last fetched balance.
///
/// Implementations only guarantee that each call is atomic on its own;
/// read-modify-write sequencing belongs to the caller.
pub trait BalanceStore: Send + Sync {
    fn read(&self) -> CacheEntry;

    fn write(&self, record: BalanceRecord, owner: CredentialFingerprint, fetched_at_millis: TimestampMs);

    fn clear(&self);
}

impl<T: BalanceStore + ?Sized> BalanceStore for Arc<T> {
    fn read(&self) -> CacheEntry {
        (**self).read()
    }

    fn write(&self, record: BalanceRecord, owner: CredentialFingerprint, fetched_at_millis: TimestampMs) {
        (**self).write(record, owner, fetched_at_millis)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

static GLOBAL_STORE: Lazy<Arc<MemoryBalanceStore>> = Lazy::new(|| Arc::new(MemoryBalanceStore::new()));

/// In-memory store. One instance per process via [`MemoryBalanceStore::global`],
/// or a private instance per test via [`MemoryBalanceStore::new`].
#[derive(Debug, Default)]
pub struct MemoryBalanceStore {
    slot: RwLock<CacheEntry>,
}

impl MemoryBalanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store.
    pub fn with_entry(entry: CacheEntry) -> Self {
        Self {
            slot: RwLock::new(entry),
        }
    }

    /// The process-wide slot shared by every controller that asks for it.
    pub fn global() -> Arc<MemoryBalanceStore> {
        Arc::clone(&GLOBAL_STORE)
    }
}

// The slot is replaced wholesale under the lock, so a poisoned guard still
// holds a consistent entry.
impl BalanceStore for MemoryBalanceStore {
    fn read(&self) -> CacheEntry {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn write(&self, record: BalanceRecord, owner: CredentialFingerprint, fetched_at_millis: TimestampMs) {
        let mut slot = self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = CacheEntry::new(record, owner, fetched_at_millis);
    }

    fn clear(&self) {
        let mut slot = self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = CacheEntry::empty();
    }
}
