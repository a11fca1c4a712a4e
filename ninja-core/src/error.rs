//! Error types for balance operations

use thiserror::Error;

/// Failure of a balance fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BalanceError {
    /// Endpoint or secret missing. Never shown to a consumer.
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// Transport failure or non-success HTTP status.
    #[error("Network error{}: {message}", http_suffix(.status))]
    Network { status: Option<u16>, message: String },

    /// Success status with a body that is not a balance record.
    #[error("Validation error: {reason}")]
    Validation { reason: String },
}

impl BalanceError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn network(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Network {
            status,
            message: message.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Whether this error reaches the consumer.
    pub fn is_surfaced(&self) -> bool {
        !matches!(self, Self::Configuration { .. })
    }

    /// HTTP status carried by a network error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } => *status,
            _ => None,
        }
    }
}

fn http_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

/// Result type alias for balance operations.
pub type BalanceResult<T> = Result<T, BalanceError>;
