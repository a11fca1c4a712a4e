//! Identity types for the balance cache

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Wall-clock instant in Unix milliseconds.
pub type TimestampMs = i64;

/// The (endpoint, secret) pair identifying which remote account is cached.
///
/// Both parts are guaranteed non-blank. A consumer without a complete pair is
/// "unbound" and never holds a `CredentialKey`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CredentialKey {
    endpoint: String,
    secret: String,
}

impl CredentialKey {
    /// Build a key from optional configuration values.
    ///
    /// Returns `None` when either part is missing or blank.
    pub fn from_parts(endpoint: Option<&str>, secret: Option<&str>) -> Option<Self> {
        let endpoint = endpoint.map(str::trim).filter(|s| !s.is_empty())?;
        let secret = secret.map(str::trim).filter(|s| !s.is_empty())?;
        Some(Self {
            endpoint: endpoint.to_string(),
            secret: secret.to_string(),
        })
    }

    /// Like [`CredentialKey::from_parts`] for owned strings.
    pub fn new(endpoint: impl Into<String>, secret: impl Into<String>) -> Option<Self> {
        let endpoint = endpoint.into();
        let secret = secret.into();
        Self::from_parts(Some(&endpoint), Some(&secret))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Stable digest of both parts, used to tag cache entries without
    /// retaining the secret in the store.
    pub fn fingerprint(&self) -> CredentialFingerprint {
        let mut hasher = Sha256::new();
        hasher.update(self.endpoint.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.secret.as_bytes());
        CredentialFingerprint(hex::encode(hasher.finalize()))
    }
}

impl fmt::Debug for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialKey")
            .field("endpoint", &self.endpoint)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Hex-encoded SHA-256 of a [`CredentialKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialFingerprint(String);

impl CredentialFingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 hex characters, safe for log output.
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Display for CredentialFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
