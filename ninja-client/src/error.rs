//! Error types for the balance client.

use crate::config::ConfigError;
use ninja_core::BalanceError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Balance(#[from] BalanceError),
    #[error("Balance updates stopped: {0}")]
    Updates(#[from] tokio::sync::watch::error::RecvError),
    #[error("Telemetry setup failed: {0}")]
    Telemetry(String),
}
