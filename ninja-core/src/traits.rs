//! Collaborator traits.
//!
//! The controller only talks to the outside world through these seams:
//! the network (`BalanceFetcher`), wall-clock time (`Clock`) and the
//! host's logging channel (`LogSink`).

use crate::{BalanceRecord, BalanceResult, CredentialKey, TimestampMs};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Performs one authenticated fetch of the balance resource.
///
/// Implementations must not retry; a failure is reported once.
#[async_trait]
pub trait BalanceFetcher: Send + Sync {
    async fn fetch(&self, credentials: &CredentialKey) -> BalanceResult<BalanceRecord>;
}

#[async_trait]
impl<T: BalanceFetcher + ?Sized> BalanceFetcher for std::sync::Arc<T> {
    async fn fetch(&self, credentials: &CredentialKey) -> BalanceResult<BalanceRecord> {
        (**self).fetch(credentials).await
    }
}

/// Source of the current time in Unix milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> TimestampMs;
}

/// Clock backed by the system UTC time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> TimestampMs {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Severity accepted by a [`LogSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    /// Level not specified by the caller.
    Unspecified,
}

/// External logging channel: `(level, message, optional stack trace)`.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, stack: Option<&str>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }
}
