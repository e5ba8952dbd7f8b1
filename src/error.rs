//! Various errors module.
//!
//! Every failure of a request issued through [`ApiClient`](crate::ApiClient) is
//! normalised into an [`ApiError`] carrying a human-readable message, the HTTP
//! status (when a response was received) and the raw response payload.

use serde_json::Value;
use thiserror::Error;

use crate::config::ErrorMessages;

/// Represents errors when interacting with the marketplace API.
///
/// Calling code is expected to display [`ApiError::message`] directly
/// (toast, snackbar, status line...).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never reached the server, or no response was received.
    ///
    /// This covers DNS failures, refused connections and timeouts. These are
    /// retried up to the configured budget before being surfaced.
    #[error("{message}")]
    Network {
        /// Message meant for the end user.
        message: String,
        /// The underlying transport error.
        detail: String,
    },
    /// Communication with the API was successful,
    /// but returned a [401 Unauthorized]("https://developer.mozilla.org/en-US/docs/Web/HTTP/Status/401")
    /// after the session refresh was already used, or the refresh itself failed.
    #[error("{message}")]
    Authorization {
        /// Message meant for the end user.
        message: String,
        /// Raw response payload, if any.
        payload: Option<Value>,
    },
    /// The API answered with a 4xx status other than 401.
    ///
    /// The caller may correct the request (400, 403, 404, 422...).
    #[error("{message}")]
    Client {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or the default one for `status`.
        message: String,
        /// Raw response payload, if any.
        payload: Option<Value>,
    },
    /// The API answered with a 5xx status.
    #[error("{message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or the generic server error message.
        message: String,
        /// Raw response payload, if any.
        payload: Option<Value>,
    },
    /// The API answered with a status that is neither a success nor an error
    /// class this crate knows how to handle.
    #[error("{message}")]
    UnexpectedResponse {
        /// HTTP status code.
        status: u16,
        /// Message derived from the payload or the status code.
        message: String,
        /// Raw response payload, if any.
        payload: Option<Value>,
    },
    /// The response could not be parsed into the expected data structure.
    #[error(
        "Parse Error: Could not parse response into the expected data structure. It usually means that there is a mismatch between the provided Generic Type Parameter and the API response. - {0}"
    )]
    ParseError(String),
    /// The request was rejected locally before anything was sent.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    /// Message to show to the end user.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Network { message, .. }
            | Self::Authorization { message, .. }
            | Self::Client { message, .. }
            | Self::Server { message, .. }
            | Self::UnexpectedResponse { message, .. } => message.clone(),
            Self::ParseError(_) | Self::Validation(_) => self.to_string(),
        }
    }

    /// HTTP status code of the response that caused the error, if one was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Authorization { .. } => Some(401),
            Self::Client { status, .. }
            | Self::Server { status, .. }
            | Self::UnexpectedResponse { status, .. } => Some(*status),
            Self::Network { .. } | Self::ParseError(_) | Self::Validation(_) => None,
        }
    }

    /// Raw response payload, if the server sent one.
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        match self {
            Self::Authorization { payload, .. }
            | Self::Client { payload, .. }
            | Self::Server { payload, .. }
            | Self::UnexpectedResponse { payload, .. } => payload.as_ref(),
            Self::Network { .. } | Self::ParseError(_) | Self::Validation(_) => None,
        }
    }

    /// Whether no response was received at all.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Whether the error ended the current session.
    #[must_use]
    pub const fn is_authorization_error(&self) -> bool {
        matches!(self, Self::Authorization { .. })
    }

    pub(crate) fn network(messages: &ErrorMessages, error: &reqwest::Error) -> Self {
        let detail = if error.is_timeout() {
            "Request timed out".to_string()
        } else if error.is_connect() {
            "Failed to connect to server".to_string()
        } else {
            error.to_string()
        };

        Self::Network {
            message: messages.network.clone(),
            detail,
        }
    }
}

/// Maps a non-2xx response onto an [`ApiError`].
///
/// A non-empty string `message` field in the payload wins over the default
/// message table. The mapping is a pure function of its inputs.
#[must_use]
pub fn normalize(status: u16, payload: Option<Value>, messages: &ErrorMessages) -> ApiError {
    let message = payload_message(payload.as_ref())
        .or_else(|| messages.for_status(status).map(str::to_owned))
        .unwrap_or_else(|| format!("Request failed with status {status}"));

    match status {
        401 => ApiError::Authorization { message, payload },
        400..=499 => ApiError::Client {
            status,
            message,
            payload,
        },
        500..=599 => ApiError::Server {
            status,
            message,
            payload,
        },
        _ => ApiError::UnexpectedResponse {
            status,
            message,
            payload,
        },
    }
}

fn payload_message(payload: Option<&Value>) -> Option<String> {
    payload?
        .get("message")?
        .as_str()
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_owned)
}

/// Represents errors raised while building a client from its configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The base URL is not an absolute `http://` or `https://` URL.
    #[error("Invalid base_url {0:?}: must be an absolute http:// or https:// URL")]
    InvalidBaseUrl(String),
    /// The configuration file could not be read.
    #[error("Could not read configuration file: {0}")]
    Read(#[from] std::io::Error),
    /// The configuration file is not valid YAML for [`ClientConfig`](crate::ClientConfig).
    #[error("Could not parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// The underlying HTTP client could not be created.
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Represents errors raised while loading a persisted token store.
#[derive(Error, Debug)]
pub enum TokenStoreError {
    /// The storage file exists but could not be read.
    #[error("Could not read token storage: {0}")]
    Read(#[from] std::io::Error),
    /// The storage file does not contain a valid session document.
    #[error("Token storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
