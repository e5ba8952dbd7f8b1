//! Client configuration.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable overriding [`ClientConfig::base_url`] when loading from a file.
pub const API_URL_ENV: &str = "MARKETPLACE_API_URL";

/// Settings of an [`ApiClient`](crate::ApiClient).
///
/// Every field has a default, so a YAML document only needs the keys it changes:
///
/// ```yaml
/// base_url: https://api.example.com/api
/// timeout_ms: 15000
/// retry_attempts: 3
/// debug: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Absolute URL every request path is relative to.
    pub base_url: String,
    /// Per-request timeout, in milliseconds. A timeout counts as a network error.
    pub timeout_ms: u64,
    /// Connection establishment timeout, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Maximum number of sends for a request failing with network errors.
    pub retry_attempts: u32,
    /// Fixed delay between two sends of the same request, in milliseconds.
    pub retry_backoff_ms: u64,
    /// Log every request and response status at `debug` level.
    pub debug: bool,
    /// Endpoint exchanging a refresh token for a new token pair.
    pub refresh_path: String,
    /// Endpoint accepting `{ identity, password }`.
    pub login_endpoint: String,
    /// Where the host application should send the user once the session expired.
    pub login_path: String,
    /// Default messages for error statuses.
    pub error_messages: ErrorMessages,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            retry_attempts: 3,
            retry_backoff_ms: 1_000,
            debug: false,
            refresh_path: "/auth/refresh-token".to_string(),
            login_endpoint: "/auth/login".to_string(),
            login_path: "/login".to_string(),
            error_messages: ErrorMessages::default(),
        }
    }
}

impl ClientConfig {
    /// Default configuration pointing at `base_url`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Parses a YAML document. Missing keys keep their default value.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads a YAML file, then applies the `MARKETPLACE_API_URL` override.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path.as_ref())?;
        let config: Self = serde_yaml::from_reader(file)?;

        Ok(config.with_env_overrides())
    }

    /// Replaces `base_url` with `MARKETPLACE_API_URL` when that variable is set and not blank.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_base_url_override(std::env::var(API_URL_ENV).ok())
    }

    fn with_base_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|url| !url.trim().is_empty()) {
            tracing::debug!(%url, "base_url overridden from environment");
            self.base_url = url;
        }
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Connection timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Delay between two network retries.
    #[must_use]
    pub const fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Validates `base_url` and strips its trailing slashes.
    pub(crate) fn normalized_base_url(&self) -> Result<String, ConfigError> {
        let trimmed = self.base_url.trim().trim_end_matches('/');

        match reqwest::Url::parse(trimmed) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
                Ok(trimmed.to_string())
            }
            _ => Err(ConfigError::InvalidBaseUrl(self.base_url.clone())),
        }
    }
}

/// Default human-readable messages, used when the API does not send its own `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorMessages {
    /// 400.
    pub bad_request: String,
    /// 401.
    pub unauthorized: String,
    /// 403.
    pub forbidden: String,
    /// 404.
    pub not_found: String,
    /// 422.
    pub unprocessable: String,
    /// Any 5xx.
    pub server_error: String,
    /// No response received.
    pub network: String,
}

impl Default for ErrorMessages {
    fn default() -> Self {
        Self {
            bad_request: "Bad request. Please check your input.".to_string(),
            unauthorized: "Your session has expired. Please log in again.".to_string(),
            forbidden: "You do not have permission to perform this action.".to_string(),
            not_found: "The requested resource was not found.".to_string(),
            unprocessable: "Validation failed. Please check your input.".to_string(),
            server_error: "Server error. Please try again later.".to_string(),
            network: "Network error. Please check your internet connection.".to_string(),
        }
    }
}

impl ErrorMessages {
    /// Default message for `status`, if the table has one.
    #[must_use]
    pub fn for_status(&self, status: u16) -> Option<&str> {
        let message = match status {
            400 => &self.bad_request,
            401 => &self.unauthorized,
            403 => &self.forbidden,
            404 => &self.not_found,
            422 => &self.unprocessable,
            500..=599 => &self.server_error,
            _ => return None,
        };

        Some(message)
    }
}
