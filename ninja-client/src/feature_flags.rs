//! Feature-flag handlers.
//!
//! The flag service itself is an external collaborator; these handlers
//! shape its answers for consumers and swallow its failures.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FeatureFlagError {
    #[error("Feature flag provider unavailable: {0}")]
    Unavailable(String),
}

/// Source of flag values and payloads.
///
/// `Ok(None)` means the flag is not defined.
#[async_trait]
pub trait FeatureFlagProvider: Send + Sync {
    async fn flag(&self, name: &str) -> Result<Option<Value>, FeatureFlagError>;

    async fn payload(&self, name: &str) -> Result<Option<Value>, FeatureFlagError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureFlagResponse {
    pub enabled: Option<bool>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureFlagPayloadResponse {
    pub payload_json: Option<String>,
}

/// Resolve a flag: booleans map to `enabled`, anything else counts as
/// enabled with its string form in `value`.
pub async fn get_feature_flag(provider: &dyn FeatureFlagProvider, name: &str) -> FeatureFlagResponse {
    match provider.flag(name).await {
        Ok(None) | Ok(Some(Value::Null)) => FeatureFlagResponse::default(),
        Ok(Some(Value::Bool(enabled))) => FeatureFlagResponse {
            enabled: Some(enabled),
            value: None,
        },
        Ok(Some(Value::String(value))) => FeatureFlagResponse {
            enabled: Some(true),
            value: Some(value),
        },
        Ok(Some(other)) => FeatureFlagResponse {
            enabled: Some(true),
            value: Some(other.to_string()),
        },
        Err(err) => {
            tracing::error!(flag = name, error = %err, "Error getting feature flag");
            FeatureFlagResponse::default()
        }
    }
}

/// Resolve a flag payload as compact JSON.
pub async fn get_feature_flag_payload(
    provider: &dyn FeatureFlagProvider,
    name: &str,
) -> FeatureFlagPayloadResponse {
    match provider.payload(name).await {
        Ok(None) | Ok(Some(Value::Null)) => FeatureFlagPayloadResponse::default(),
        Ok(Some(payload)) => FeatureFlagPayloadResponse {
            payload_json: Some(payload.to_string()),
        },
        Err(err) => {
            tracing::error!(flag = name, error = %err, "Error getting feature flag payload");
            FeatureFlagPayloadResponse::default()
        }
    }
}

/// In-memory provider, typically filled from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticFeatureFlags {
    flags: HashMap<String, Value>,
    payloads: HashMap<String, Value>,
}

impl StaticFeatureFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_payloads(payloads: HashMap<String, Value>) -> Self {
        Self {
            flags: HashMap::new(),
            payloads,
        }
    }

    pub fn with_flag(mut self, name: impl Into<String>, value: Value) -> Self {
        self.flags.insert(name.into(), value);
        self
    }

    pub fn with_payload(mut self, name: impl Into<String>, payload: Value) -> Self {
        self.payloads.insert(name.into(), payload);
        self
    }
}

#[async_trait]
impl FeatureFlagProvider for StaticFeatureFlags {
    async fn flag(&self, name: &str) -> Result<Option<Value>, FeatureFlagError> {
        Ok(self.flags.get(name).cloned())
    }

    async fn payload(&self, name: &str) -> Result<Option<Value>, FeatureFlagError> {
        Ok(self.payloads.get(name).cloned())
    }
}
