//! Ninja account balance client library exports.

pub mod banner;
pub mod config;
pub mod controller;
pub mod default_model;
pub mod error;
pub mod feature_flags;
pub mod fetcher;
pub mod logging;

pub use banner::{manage_balance_url, open_manage_page, BalanceBanner, OpenUrlError, UrlOpener};
pub use config::{ClientConfig, ConfigError};
pub use controller::{BalanceController, ControllerConfig};
pub use default_model::{DefaultModelResolver, FALLBACK_DEFAULT_MODEL_ID, MODEL_SETTINGS_FLAG};
pub use error::ClientError;
pub use feature_flags::{
    get_feature_flag, get_feature_flag_payload, FeatureFlagError, FeatureFlagPayloadResponse,
    FeatureFlagProvider, FeatureFlagResponse, StaticFeatureFlags,
};
pub use fetcher::{get_account_balance, AccountBalanceRequest, HttpBalanceFetcher};
pub use logging::{init_tracing, log_message, LogMessageRequest, TracingLogSink};
