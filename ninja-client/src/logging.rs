//! Logging: the host log sink and tracing setup.

use crate::error::ClientError;
use ninja_core::{LogLevel, LogSink};
use tracing_subscriber::EnvFilter;

/// Prefix marking messages that originate on the consumer side.
pub const WEBVIEW_LOG_PREFIX: &str = "[Webview] ";

/// [`LogSink`] that forwards to `tracing`.
#[derive(Debug, Clone)]
pub struct TracingLogSink {
    prefix: String,
}

impl TracingLogSink {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for TracingLogSink {
    fn default() -> Self {
        Self::with_prefix(WEBVIEW_LOG_PREFIX)
    }
}

impl LogSink for TracingLogSink {
    fn log(&self, level: LogLevel, message: &str, stack: Option<&str>) {
        let message = format!("{}{}", self.prefix, message);
        match level {
            LogLevel::Debug => tracing::debug!("{}", message),
            LogLevel::Info | LogLevel::Unspecified => tracing::info!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Error => match stack {
                Some(stack) => tracing::error!(stack, "{}", message),
                None => tracing::error!("{}", message),
            },
        }
    }
}

/// Request shape of the host-side `logMessage` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessageRequest {
    pub level: LogLevel,
    pub message: String,
    pub error_stack: Option<String>,
}

/// Host-side handler: forward a consumer log line to the sink.
pub fn log_message(sink: &dyn LogSink, request: &LogMessageRequest) {
    sink.log(request.level, &request.message, request.error_stack.as_deref());
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over `default_filter` when set.
pub fn init_tracing(default_filter: &str) -> Result<(), ClientError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| ClientError::Telemetry(e.to_string()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| ClientError::Telemetry(e.to_string()))
}
