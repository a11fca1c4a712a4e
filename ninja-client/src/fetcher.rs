//! HTTP fetcher for the account balance endpoint.

use crate::config::ClientConfig;
use crate::error::ClientError;
use async_trait::async_trait;
use ninja_core::{BalanceError, BalanceFetcher, BalanceRecord, BalanceResult, CredentialKey};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde_json::{Number, Value};
use std::time::Duration;

/// Path appended to the configured endpoint.
pub const ACCOUNT_BALANCE_PATH: &str = "/account_balance";

/// Longest slice of an error body kept in a network error.
const ERROR_BODY_EXCERPT_CHARS: usize = 200;

/// Issues `GET {endpoint}/account_balance` with a bearer token.
///
/// One request per call, no retries. The transport timeout is the only
/// timeout applied.
#[derive(Clone)]
pub struct HttpBalanceFetcher {
    client: reqwest::Client,
}

impl HttpBalanceFetcher {
    pub fn new(request_timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(config.request_timeout())
    }

    async fn fetch_once(&self, credentials: &CredentialKey) -> BalanceResult<BalanceRecord> {
        let url = balance_url(credentials.endpoint());
        let auth = HeaderValue::from_str(&format!("Bearer {}", credentials.secret()))
            .map_err(|_| BalanceError::network(None, "API key is not a valid header value"))?;

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, auth)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;
        if !status.is_success() {
            let excerpt: String = body.chars().take(ERROR_BODY_EXCERPT_CHARS).collect();
            let reason = status.canonical_reason().unwrap_or("unexpected status");
            let message = if excerpt.trim().is_empty() {
                reason.to_string()
            } else {
                format!("{}: {}", reason, excerpt.trim())
            };
            return Err(BalanceError::network(Some(status.as_u16()), message));
        }

        parse_balance_body(&body)
    }
}

#[async_trait]
impl BalanceFetcher for HttpBalanceFetcher {
    async fn fetch(&self, credentials: &CredentialKey) -> BalanceResult<BalanceRecord> {
        let result = self.fetch_once(credentials).await;
        if let Err(err) = &result {
            tracing::warn!(
                error = %err,
                endpoint = credentials.endpoint(),
                "Failed to fetch account balance"
            );
        }
        result
    }
}

/// Join the endpoint and the balance path, tolerating a trailing slash.
pub fn balance_url(endpoint: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), ACCOUNT_BALANCE_PATH)
}

// A request that cannot be built is a failed call, not missing credentials.
fn map_transport_error(err: reqwest::Error) -> BalanceError {
    if err.is_builder() {
        return BalanceError::network(None, format!("invalid API base URL: {}", err));
    }
    BalanceError::network(err.status().map(|s| s.as_u16()), err.to_string())
}

/// Parse and validate a success body into a [`BalanceRecord`].
pub fn parse_balance_body(body: &str) -> BalanceResult<BalanceRecord> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| BalanceError::validation(format!("response is not JSON: {}", e)))?;
    parse_balance_value(&value)
}

/// Validate an already decoded body field by field.
///
/// Requires a numeric `balance_nanos` that is a whole number fitting in
/// `i64`, and a string `keys_status`. Extra fields are ignored.
pub fn parse_balance_value(value: &Value) -> BalanceResult<BalanceRecord> {
    let object = value
        .as_object()
        .ok_or_else(|| BalanceError::validation("response is not a JSON object"))?;

    let balance_nanos = match object.get("balance_nanos") {
        Some(Value::Number(n)) => nanos_from_number(n)?,
        Some(_) => return Err(BalanceError::validation("balance_nanos is not a number")),
        None => return Err(BalanceError::validation("balance_nanos is missing")),
    };

    let keys_status = match object.get("keys_status") {
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(BalanceError::validation("keys_status is not a string")),
        None => return Err(BalanceError::validation("keys_status is missing")),
    };

    Ok(BalanceRecord {
        balance_nanos,
        keys_status,
    })
}

fn nanos_from_number(n: &Number) -> BalanceResult<i64> {
    if let Some(v) = n.as_i64() {
        return Ok(v);
    }
    // Whole floats such as 5e9 are accepted; i64::MAX as f64 rounds up to 2^63.
    if let Some(v) = n.as_f64() {
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
            return Ok(v as i64);
        }
    }
    Err(BalanceError::validation(format!(
        "balance_nanos {} is not a whole number of nanos",
        n
    )))
}

/// Request shape of the host-side `getAccountBalance` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountBalanceRequest {
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,
}

/// Host-side handler: validate the request, then fetch once.
///
/// Missing parts fail with a configuration error and no request is made.
pub async fn get_account_balance<F>(fetcher: &F, request: &AccountBalanceRequest) -> BalanceResult<BalanceRecord>
where
    F: BalanceFetcher + ?Sized,
{
    let key = CredentialKey::from_parts(request.api_base_url.as_deref(), request.api_key.as_deref())
        .ok_or_else(|| BalanceError::configuration("API base URL and API key are required"))?;
    fetcher.fetch(&key).await
}
