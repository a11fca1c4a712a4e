//! Ninja Core - Balance Types
//!
//! Data types and collaborator traits shared by every Ninja crate.
//! Orchestration lives in ninja-client, storage in ninja-storage.

pub mod balance;
pub mod error;
pub mod identity;
pub mod traits;

pub use balance::{format_balance, BalanceRecord, BalanceView, FetchState, NANOS_PER_UNIT};
pub use error::{BalanceError, BalanceResult};
pub use identity::{CredentialFingerprint, CredentialKey, TimestampMs};
pub use traits::{BalanceFetcher, Clock, LogLevel, LogSink, SystemClock};

/// Window after a successful fetch during which the cached balance is served
/// without contacting the remote service.
pub const FRESHNESS_WINDOW_MS: i64 = 30_000;
