//! Ninja Test Utilities
//!
//! Shared test infrastructure for the balance client workspace:
//! - Scripted fetcher with optional gates to hold a fetch in flight
//! - Manual clock and recording log sink
//! - Proptest generators and fixtures

pub use ninja_core::{
    BalanceError, BalanceFetcher, BalanceRecord, BalanceResult, BalanceView, Clock,
    CredentialKey, FetchState, LogLevel, LogSink, TimestampMs,
};
pub use ninja_storage::{BalanceStore, CacheEntry, MemoryBalanceStore};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};

// ============================================================================
// SCRIPTED FETCHER
// ============================================================================

struct ScriptedResponse {
    result: BalanceResult<BalanceRecord>,
    gate: Option<oneshot::Receiver<()>>,
}

/// Holds a gated fetch in flight until released or dropped.
#[derive(Debug)]
pub struct FetchGate {
    tx: oneshot::Sender<()>,
}

impl FetchGate {
    pub fn release(self) {
        let _ = self.tx.send(());
    }
}

/// Fetcher answering from a FIFO script.
///
/// Each call pops the next response. An exhausted script answers with a
/// network error.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    seen: Mutex<Vec<CredentialKey>>,
    calls: AtomicUsize,
    called: Notify,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a script that succeeds once with `record`.
    pub fn returning(record: BalanceRecord) -> Self {
        let fetcher = Self::new();
        fetcher.push(Ok(record));
        fetcher
    }

    pub fn push(&self, result: BalanceResult<BalanceRecord>) {
        self.lock_responses().push_back(ScriptedResponse { result, gate: None });
    }

    /// Queue a response that is only returned once the gate is released.
    pub fn push_gated(&self, result: BalanceResult<BalanceRecord>) -> FetchGate {
        let (tx, rx) = oneshot::channel();
        self.lock_responses().push_back(ScriptedResponse {
            result,
            gate: Some(rx),
        });
        FetchGate { tx }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn credentials_seen(&self) -> Vec<CredentialKey> {
        self.seen.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Resolve once at least `n` fetches have started.
    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let called = self.called.notified();
            if self.calls() >= n {
                return;
            }
            called.await;
        }
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<ScriptedResponse>> {
        self.responses.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl BalanceFetcher for ScriptedFetcher {
    async fn fetch(&self, key: &CredentialKey) -> BalanceResult<BalanceRecord> {
        let next = self.lock_responses().pop_front();
        self.seen
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(key.clone());
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.called.notify_waiters();

        let Some(ScriptedResponse { result, gate }) = next else {
            return Err(BalanceError::network(None, "no scripted response"));
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        result
    }
}

// ============================================================================
// CLOCK AND LOG SINK
// ============================================================================

/// Clock that only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn at(now: TimestampMs) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now)),
        }
    }

    pub fn set(&self, now: TimestampMs) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> TimestampMs {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub stack: Option<String>,
}

/// Log sink that keeps every entry.
#[derive(Debug, Default)]
pub struct RecordingLogSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl RecordingLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn at_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .collect()
    }

    pub fn errors(&self) -> Vec<LogEntry> {
        self.at_level(LogLevel::Error)
    }
}

impl LogSink for RecordingLogSink {
    fn log(&self, level: LogLevel, message: &str, stack: Option<&str>) {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(LogEntry {
                level,
                message: message.to_string(),
                stack: stack.map(str::to_string),
            });
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for balance types.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_keys_status() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("active".to_string()),
            Just("suspended".to_string()),
            "[a-z_]{1,12}",
        ]
    }

    pub fn arb_balance_record() -> impl Strategy<Value = BalanceRecord> {
        (0i64..1_000_000 * ninja_core::NANOS_PER_UNIT, arb_keys_status())
            .prop_map(|(nanos, status)| BalanceRecord::new(nanos, status))
    }

    pub fn arb_credential_key() -> impl Strategy<Value = CredentialKey> {
        ("[a-z]{1,10}", "sk-[A-Za-z0-9]{8,24}").prop_filter_map("blank key", |(host, secret)| {
            CredentialKey::new(format!("https://{}.myninja.ai", host), secret)
        })
    }

    /// Timestamps between 2020 and 2030, in milliseconds.
    pub fn arb_timestamp() -> impl Strategy<Value = TimestampMs> {
        1_577_836_800_000i64..1_893_456_000_000i64
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built values for common scenarios.

    use super::*;

    pub const TEST_ENDPOINT: &str = "https://api.test.myninja.ai";

    /// Arbitrary fixed start time for manual clocks.
    pub const T0: TimestampMs = 1_700_000_000_000;

    pub fn test_key(secret: &str) -> CredentialKey {
        CredentialKey::from_parts(Some(TEST_ENDPOINT), Some(secret))
            .unwrap_or_else(|| panic!("fixture secret must not be blank: {:?}", secret))
    }

    pub fn active_record(balance_nanos: i64) -> BalanceRecord {
        BalanceRecord::new(balance_nanos, "active")
    }

    /// Store holding `record` for `key`, fetched at `fetched_at`.
    pub fn store_with(record: BalanceRecord, key: &CredentialKey, fetched_at: TimestampMs) -> Arc<MemoryBalanceStore> {
        Arc::new(MemoryBalanceStore::with_entry(CacheEntry::new(
            record,
            key.fingerprint(),
            fetched_at,
        )))
    }
}
