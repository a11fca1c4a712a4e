//! Balance record and the consumer-facing view of it.

use crate::BalanceError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Nanos per currency unit.
pub const NANOS_PER_UNIT: i64 = 1_000_000_000;

const NANOS_PER_CENT: u64 = 10_000_000;

/// Account balance as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BalanceRecord {
    /// Fixed-point balance in nanos of the currency unit.
    pub balance_nanos: i64,
    /// Opaque key status token ("active", "suspended", ...).
    pub keys_status: String,
}

impl BalanceRecord {
    pub fn new(balance_nanos: i64, keys_status: impl Into<String>) -> Self {
        Self {
            balance_nanos,
            keys_status: keys_status.into(),
        }
    }

    /// Display string, e.g. `$5.00`.
    pub fn display_amount(&self) -> String {
        format_balance(self.balance_nanos)
    }
}

/// Render nanos as a dollar amount with two decimals.
///
/// Digits past the cent are truncated toward zero, never rounded.
pub fn format_balance(balance_nanos: i64) -> String {
    let abs = balance_nanos.unsigned_abs();
    let units = abs / NANOS_PER_UNIT as u64;
    let cents = (abs % NANOS_PER_UNIT as u64) / NANOS_PER_CENT;
    let sign = if balance_nanos < 0 && (units > 0 || cents > 0) {
        "-"
    } else {
        ""
    };
    format!("{}${}.{:02}", sign, units, cents)
}

/// Per-controller fetch state. Ephemeral, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchState {
    /// No complete credentials are bound.
    #[default]
    Unbound,
    /// Holding the last published record, nothing in flight.
    Idle,
    /// Foreground fetch; the consumer is blocked on it.
    Loading,
    /// Background fetch while a stale record is being served.
    Revalidating,
    /// Last fetch failed; a stale record may still be visible.
    Error,
}

impl FetchState {
    /// True while a fetch for the current binding is outstanding.
    pub fn is_fetching(&self) -> bool {
        matches!(self, Self::Loading | Self::Revalidating)
    }
}

/// What a consumer sees: `{ record, isLoading, error }`.
///
/// `record` and `error` may both be set after a failed background refresh.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BalanceView {
    pub record: Option<BalanceRecord>,
    pub is_loading: bool,
    pub error: Option<Arc<BalanceError>>,
}

impl BalanceView {
    /// No data, not loading, no error.
    pub fn unbound() -> Self {
        Self::default()
    }

    pub fn loading() -> Self {
        Self {
            record: None,
            is_loading: true,
            error: None,
        }
    }

    pub fn ready(record: BalanceRecord) -> Self {
        Self {
            record: Some(record),
            is_loading: false,
            error: None,
        }
    }

    /// Error surfaced next to whatever record is still visible.
    pub fn failed(record: Option<BalanceRecord>, error: BalanceError) -> Self {
        Self {
            record,
            is_loading: false,
            error: Some(Arc::new(error)),
        }
    }

    pub fn has_data(&self) -> bool {
        self.record.is_some()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_whole_units() {
        assert_eq!(format_balance(5_000_000_000), "$5.00");
        assert_eq!(format_balance(0), "$0.00");
        assert_eq!(format_balance(1_000_000_000_000), "$1000.00");
    }

    #[test]
    fn test_format_truncates() {
        assert_eq!(format_balance(1_239_999_999), "$1.23");
        assert_eq!(format_balance(9_999_999), "$0.00");
        assert_eq!(format_balance(10_000_000), "$0.01");
        assert_eq!(format_balance(2_999_999_999), "$2.99");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_balance(-1_500_000_000), "-$1.50");
        assert_eq!(format_balance(-5_000_000), "$0.00");
        assert_eq!(format_balance(i64::MIN), "-$9223372036.85");
    }

    #[test]
    fn test_record_display_amount() {
        let record = BalanceRecord::new(5_000_000_000, "active");
        assert_eq!(record.display_amount(), "$5.00");
    }

    #[test]
    fn test_view_constructors() {
        let unbound = BalanceView::unbound();
        assert!(!unbound.has_data() && !unbound.is_loading && !unbound.has_error());

        let loading = BalanceView::loading();
        assert!(loading.is_loading && !loading.has_data());

        let record = BalanceRecord::new(1, "active");
        let failed = BalanceView::failed(
            Some(record.clone()),
            BalanceError::network(Some(500), "boom"),
        );
        assert_eq!(failed.record, Some(record));
        assert!(failed.has_error());
        assert!(!failed.is_loading);
    }

    #[test]
    fn test_fetch_state_is_fetching() {
        assert!(FetchState::Loading.is_fetching());
        assert!(FetchState::Revalidating.is_fetching());
        assert!(!FetchState::Idle.is_fetching());
        assert!(!FetchState::Error.is_fetching());
        assert_eq!(FetchState::default(), FetchState::Unbound);
    }

    proptest! {
        #[test]
        fn format_matches_integer_division(nanos in 0i64..i64::MAX) {
            let rendered = format_balance(nanos);
            let expected_units = nanos / NANOS_PER_UNIT;
            let expected_cents = (nanos % NANOS_PER_UNIT) / 10_000_000;
            prop_assert_eq!(rendered, format!("${}.{:02}", expected_units, expected_cents));
        }

        #[test]
        fn format_is_sign_symmetric(nanos in 1i64..i64::MAX) {
            let positive = format_balance(nanos);
            let negative = format_balance(-nanos);
            if positive == "$0.00" {
                prop_assert_eq!(negative, "$0.00");
            } else {
                prop_assert_eq!(negative, format!("-{}", positive));
            }
        }
    }
}
