//! Configuration types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::ConfigError;

/// Secret key of a deployment target.
///
/// `Debug` and `Display` are redacted so the key never ends up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretKey(String);

impl SecretKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for request bodies only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Validated, immutable parameters shared by every request of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub app_name: String,
    pub secret_key: SecretKey,
    pub base_url: Url,
}

impl SessionConfig {
    #[must_use]
    pub fn new(app_name: impl Into<String>, secret_key: SecretKey, base_url: Url) -> Self {
        Self {
            app_name: app_name.into(),
            secret_key,
            base_url,
        }
    }
}

/// Deployment target as read from file, environment or CLI.
///
/// Values are unvalidated until [`DeployConfig::validate`] is called.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Application name on the deployment server.
    pub app_name: Option<String>,
    /// Secret key of the application.
    pub secret_key: Option<SecretKey>,
    /// Base URL of the deployment endpoint.
    pub url: Option<String>,
}

impl DeployConfig {
    /// Trim and check all values, producing a session configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if any value is absent or blank, and
    /// `ConfigError::InvalidUrl` if the URL does not parse or is not http(s).
    pub fn validate(&self) -> Result<SessionConfig, ConfigError> {
        let secret_key = self
            .secret_key
            .as_ref()
            .map(|k| k.expose().trim())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::Missing("secret_key"))?;
        let app_name = self
            .app_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(ConfigError::Missing("app_name"))?;
        let raw_url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::Missing("url"))?;

        let base_url = Url::parse(raw_url).map_err(|e| ConfigError::InvalidUrl {
            url: raw_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: raw_url.to_string(),
                reason: format!("unsupported scheme '{}'", base_url.scheme()),
            });
        }

        Ok(SessionConfig::new(
            app_name,
            SecretKey::new(secret_key),
            base_url,
        ))
    }
}

/// Tail loop tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TailConfig {
    /// Wait between status polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Give up after this many polls. Unlimited when unset.
    pub max_polls: Option<u32>,
}

impl TailConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            max_polls: None,
        }
    }
}

/// HTTP transport tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Retries for 5xx responses to status and clear requests.
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            max_retries: 3,
        }
    }
}

/// Complete configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub deploy: DeployConfig,
    pub tail: TailConfig,
    pub http: HttpConfig,
}
