//! Balance cache store with explicit freshness.
//!
//! The store is a single memory-resident slot holding the last fetched
//! [`BalanceRecord`](ninja_core::BalanceRecord), when it was fetched, and the
//! fingerprint of the credentials that fetched it. Staleness is never an
//! eviction event: readers classify an entry with [`CacheEntry::classify`]
//! and decide for themselves whether to serve it.
//!
//! The store performs no sequencing. Whoever composes it (the balance
//! controller) is responsible for not interleaving conflicting writes.
//!
//! # Example
//!
//! ```ignore
//! let store = MemoryBalanceStore::new();
//! store.write(record, key.fingerprint(), clock.now_millis());
//!
//! match store.read().visible_to(CacheScope::PerCredential, &key.fingerprint()) {
//!     Some(entry) => match entry.classify(now, window) { ... },
//!     None => { /* treat as empty */ }
//! }
//! ```

pub mod freshness;
pub mod store;

pub use freshness::{CacheEntry, CacheScope, EntryFreshness};
pub use store::{BalanceStore, MemoryBalanceStore};
