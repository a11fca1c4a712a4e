//! Stale-while-revalidate controller for the account balance.
//!
//! The controller binds a [`CredentialKey`] to a [`BalanceStore`] and a
//! [`BalanceFetcher`] and publishes a [`BalanceView`] to its consumers.
//!
//! # State machine
//!
//! On every (re)binding the cache entry visible to the key is classified:
//!
//! - missing: `Loading`, foreground fetch, consumer sees `is_loading`
//! - fresh: `Idle`, cached record served, no fetch
//! - stale: stale record served at once, `Revalidating` in the background
//!
//! A foreground failure clears the store and publishes the error alone. A
//! background failure leaves the store alone and publishes the error next to
//! the stale record.
//!
//! # Cancellation
//!
//! Each binding owns a [`CancellationToken`]. Rebinding, unbinding, shutdown
//! and drop cancel it. The fetch task checks the token under the state lock
//! before touching the store or publishing, so a superseded fetch can never
//! overwrite the state of a newer binding.

use crate::logging::TracingLogSink;
use ninja_core::{
    BalanceError, BalanceFetcher, BalanceRecord, BalanceView, Clock, CredentialFingerprint,
    CredentialKey, FetchState, LogLevel, LogSink, SystemClock, FRESHNESS_WINDOW_MS,
};
use ninja_storage::{BalanceStore, CacheScope, EntryFreshness};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Controller tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Age up to which a cached record is served without fetching.
    pub freshness_window: Duration,
    /// Whether cache entries are partitioned by credentials.
    pub cache_scope: CacheScope,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            freshness_window: Duration::from_millis(FRESHNESS_WINDOW_MS as u64),
            cache_scope: CacheScope::PerCredential,
        }
    }
}

impl ControllerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    pub fn with_cache_scope(mut self, scope: CacheScope) -> Self {
        self.cache_scope = scope;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    /// Nothing usable cached; the consumer waits.
    Foreground,
    /// Stale record on screen; refresh silently.
    Background,
}

struct Binding {
    key: CredentialKey,
    fingerprint: CredentialFingerprint,
    token: CancellationToken,
    in_flight: bool,
}

impl Binding {
    fn new(key: CredentialKey) -> Self {
        let fingerprint = key.fingerprint();
        Self {
            key,
            fingerprint,
            token: CancellationToken::new(),
            in_flight: false,
        }
    }
}

#[derive(Default)]
struct ControllerState {
    binding: Option<Binding>,
    fetch_state: FetchState,
}

struct Shared<F, S, C> {
    fetcher: F,
    store: S,
    clock: C,
    log: Arc<dyn LogSink>,
    config: ControllerConfig,
    state: Mutex<ControllerState>,
    view_tx: watch::Sender<BalanceView>,
}

/// Consumer-facing orchestrator for the balance cache.
///
/// Fetches run on the ambient Tokio runtime; `bind` and `refresh` must be
/// called from within one.
pub struct BalanceController<F, S, C = SystemClock>
where
    F: BalanceFetcher + 'static,
    S: BalanceStore + 'static,
    C: Clock + 'static,
{
    shared: Arc<Shared<F, S, C>>,
}

impl<F, S> BalanceController<F, S, SystemClock>
where
    F: BalanceFetcher + 'static,
    S: BalanceStore + 'static,
{
    /// Controller on the system clock, logging through `tracing`.
    pub fn new(fetcher: F, store: S, config: ControllerConfig) -> Self {
        Self::with_parts(
            fetcher,
            store,
            SystemClock,
            Arc::new(TracingLogSink::default()),
            config,
        )
    }
}

impl<F, S, C> BalanceController<F, S, C>
where
    F: BalanceFetcher + 'static,
    S: BalanceStore + 'static,
    C: Clock + 'static,
{
    pub fn with_parts(
        fetcher: F,
        store: S,
        clock: C,
        log: Arc<dyn LogSink>,
        config: ControllerConfig,
    ) -> Self {
        let (view_tx, _) = watch::channel(BalanceView::unbound());
        Self {
            shared: Arc::new(Shared {
                fetcher,
                store,
                clock,
                log,
                config,
                state: Mutex::new(ControllerState::default()),
                view_tx,
            }),
        }
    }

    /// Bind new credentials, or unbind with `None`.
    ///
    /// Rebinding the current key is a no-op unless the controller was shut
    /// down. Any other change cancels the in-flight fetch of the previous
    /// binding and re-evaluates the cache.
    pub fn bind(&self, credentials: Option<CredentialKey>) {
        let mut state = self.shared.lock_state();
        let unchanged = match (state.binding.as_ref(), credentials.as_ref()) {
            (Some(binding), Some(key)) => !binding.token.is_cancelled() && binding.key == *key,
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        if let Some(previous) = state.binding.take() {
            previous.token.cancel();
            tracing::debug!(
                fingerprint = previous.fingerprint.short(),
                in_flight = previous.in_flight,
                "Balance binding replaced"
            );
        }

        match credentials {
            Some(key) => {
                state.binding = Some(Binding::new(key));
                self.shared.evaluate(&mut state);
            }
            None => {
                state.fetch_state = FetchState::Unbound;
                self.shared.publish(BalanceView::unbound());
            }
        }
    }

    /// Bind from optional configuration values; blank or missing parts unbind.
    pub fn bind_parts(&self, endpoint: Option<&str>, secret: Option<&str>) {
        self.bind(CredentialKey::from_parts(endpoint, secret));
    }

    /// Re-evaluate the current binding against the cache.
    ///
    /// No-op when unbound, after [`shutdown`](Self::shutdown), or while a
    /// fetch for this binding is in flight.
    pub fn refresh(&self) {
        let mut state = self.shared.lock_state();
        let settled = state
            .binding
            .as_ref()
            .is_some_and(|b| !b.in_flight && !b.token.is_cancelled());
        if settled {
            self.shared.evaluate(&mut state);
        }
    }

    /// Latest published view.
    pub fn view(&self) -> BalanceView {
        self.shared.view_tx.borrow().clone()
    }

    /// Receiver notified on every publication.
    pub fn subscribe(&self) -> watch::Receiver<BalanceView> {
        self.shared.view_tx.subscribe()
    }

    pub fn state(&self) -> FetchState {
        self.shared.lock_state().fetch_state
    }

    pub fn bound_key(&self) -> Option<CredentialKey> {
        self.shared.lock_state().binding.as_ref().map(|b| b.key.clone())
    }

    /// Cancel the in-flight fetch, if any. The last view stays published and
    /// `refresh` does nothing until the next `bind`.
    pub fn shutdown(&self) {
        let state = self.shared.lock_state();
        if let Some(binding) = state.binding.as_ref() {
            binding.token.cancel();
        }
    }
}

impl<F, S, C> Drop for BalanceController<F, S, C>
where
    F: BalanceFetcher + 'static,
    S: BalanceStore + 'static,
    C: Clock + 'static,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<F, S, C> Shared<F, S, C>
where
    F: BalanceFetcher + 'static,
    S: BalanceStore + 'static,
    C: Clock + 'static,
{
    // Transitions leave the state consistent before any call that could
    // panic, so a poisoned lock is safe to reuse.
    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, view: BalanceView) {
        self.view_tx.send_replace(view);
    }

    /// Classify the cache for the bound key and pick serve, revalidate or fetch.
    fn evaluate(self: &Arc<Self>, state: &mut ControllerState) {
        let Some(binding) = state.binding.as_mut().filter(|b| !b.token.is_cancelled()) else {
            return;
        };

        let now = self.clock.now_millis();
        let entry = self
            .store
            .read()
            .visible_to(self.config.cache_scope, &binding.fingerprint);
        let freshness = entry
            .as_ref()
            .map(|e| e.classify(now, self.config.freshness_window))
            .unwrap_or(EntryFreshness::Missing);
        let cached = entry.and_then(|e| e.record);

        let (next_state, view, mode) = match (cached, freshness) {
            (Some(record), EntryFreshness::Fresh { age }) => {
                tracing::debug!(age_ms = age.as_millis() as u64, "Serving fresh cached balance");
                (FetchState::Idle, BalanceView::ready(record), None)
            }
            (Some(record), EntryFreshness::Stale { age }) => {
                tracing::debug!(age_ms = age.as_millis() as u64, "Serving stale balance, revalidating");
                (
                    FetchState::Revalidating,
                    BalanceView::ready(record),
                    Some(FetchMode::Background),
                )
            }
            _ => (
                FetchState::Loading,
                BalanceView::loading(),
                Some(FetchMode::Foreground),
            ),
        };

        if let Some(mode) = mode {
            binding.in_flight = true;
            let task = Arc::clone(self).run_fetch(binding.key.clone(), binding.token.clone(), mode);
            tokio::spawn(task);
        }
        state.fetch_state = next_state;
        self.publish(view);
    }

    async fn run_fetch(self: Arc<Self>, key: CredentialKey, token: CancellationToken, mode: FetchMode) {
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!(?mode, "Balance fetch cancelled before completion");
                return;
            }
            outcome = self.fetcher.fetch(&key) => outcome,
        };
        self.complete(&token, mode, outcome);
    }

    fn complete(&self, token: &CancellationToken, mode: FetchMode, outcome: Result<BalanceRecord, BalanceError>) {
        let mut state = self.lock_state();
        // Checked under the lock: bind() cancels under the same lock.
        if token.is_cancelled() {
            tracing::debug!(?mode, "Discarding superseded balance fetch");
            return;
        }
        let Some(binding) = state.binding.as_mut() else {
            return;
        };
        binding.in_flight = false;
        let fingerprint = binding.fingerprint.clone();

        match outcome {
            Ok(record) => {
                self.store
                    .write(record.clone(), fingerprint, self.clock.now_millis());
                state.fetch_state = FetchState::Idle;
                self.log.log(
                    LogLevel::Info,
                    &format!(
                        "Account balance fetched successfully: {} nanos",
                        record.balance_nanos
                    ),
                    None,
                );
                self.publish(BalanceView::ready(record));
            }
            Err(err) if !err.is_surfaced() => {
                tracing::warn!(error = %err, ?mode, "Balance fetch skipped: credentials unusable");
                state.fetch_state = FetchState::Idle;
                let record = match mode {
                    FetchMode::Foreground => None,
                    FetchMode::Background => self.view_tx.borrow().record.clone(),
                };
                self.publish(BalanceView {
                    record,
                    is_loading: false,
                    error: None,
                });
            }
            Err(err) => {
                self.log.log(
                    LogLevel::Error,
                    &format!("[useAccountBalance] Fetch error: {}", err),
                    Some(&format!("{:?}", err)),
                );
                state.fetch_state = FetchState::Error;
                match mode {
                    FetchMode::Foreground => {
                        self.store.clear();
                        self.publish(BalanceView::failed(None, err));
                    }
                    FetchMode::Background => {
                        let record = self.view_tx.borrow().record.clone();
                        self.publish(BalanceView::failed(record, err));
                    }
                }
            }
        }
    }
}
