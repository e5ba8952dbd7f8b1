//! Authenticated request pipeline.
//!
//! A request is described once by a `PendingRequest` and may be sent several
//! times:
//!
//! - after a network error, up to [`ClientConfig::retry_attempts`](crate::ClientConfig::retry_attempts)
//!   sends in total, separated by the fixed backoff (idempotent methods only,
//!   unless [`RequestBuilder::retries`] says otherwise);
//! - once more after a 401, if refreshing the session succeeded.
//!
//! Every other response is final.

use std::fmt;
use std::marker::PhantomData;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::ApiClient;
use crate::error::{ApiError, normalize};

/// HTTP methods accepted by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Upper-case method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Whether sending the request twice has the same effect as sending it once.
    #[must_use]
    pub const fn is_idempotent(self) -> bool {
        matches!(self, Self::Get | Self::Put | Self::Delete)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Patch => Self::PATCH,
            Method::Delete => Self::DELETE,
        }
    }
}

/// Everything needed to send (and re-send) one request.
#[derive(Debug, Clone)]
pub(crate) struct PendingRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<Value>,
    pub(crate) headers: HeaderMap,
    pub(crate) max_attempts: u32,
    pub(crate) authenticated: bool,
}

/// Builder for a request issued through an [`ApiClient`].
///
/// Created by [`ApiClient::request`] and its shortcuts; nothing is sent until
/// [`RequestBuilder::call`] is awaited.
#[must_use = "a request does nothing until `.call().await` is used"]
pub struct RequestBuilder<'a, T> {
    client: &'a ApiClient,
    request: PendingRequest,
    error: Option<String>,
    _marker: PhantomData<T>,
}

impl<'a, T: DeserializeOwned> RequestBuilder<'a, T> {
    pub(crate) fn new(client: &'a ApiClient, method: Method, path: &str) -> Self {
        Self {
            client,
            request: PendingRequest {
                method,
                path: path.to_string(),
                query: Vec::new(),
                body: None,
                headers: HeaderMap::new(),
                max_attempts: if method.is_idempotent() {
                    client.config.retry_attempts
                } else {
                    1
                },
                authenticated: true,
            },
            error: None,
            _marker: PhantomData,
        }
    }

    /// Send `body` as JSON.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => self.request.body = Some(body),
            Err(error) => {
                self.error = Some(format!("Request body could not be serialized: {error}"));
            }
        }
        self
    }

    /// Append a query parameter.
    ///
    /// # Example
    /// ```rust,ignore
    /// .query("status", "pending")
    /// ```
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.request.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a header to every send of this request.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.request.headers.insert(name, value);
            }
            _ => self.error = Some(format!("Invalid header {name:?}")),
        }
        self
    }

    /// Override the maximum number of sends on network errors (at least one).
    ///
    /// `GET`, `PUT` and `DELETE` default to
    /// [`ClientConfig::retry_attempts`](crate::ClientConfig::retry_attempts).
    /// `POST` and `PATCH` default to a single send, since re-sending them could
    /// apply the change twice.
    ///
    /// # Example
    /// ```rust,ignore
    /// client.post::<Value>("/notifications/read").retries(3).call().await?;
    /// ```
    pub fn retries(mut self, max_attempts: u32) -> Self {
        self.request.max_attempts = max_attempts;
        self
    }

    /// Send without the access token; a 401 is then returned as is, without refreshing.
    pub fn anonymous(mut self) -> Self {
        self.request.authenticated = false;
        self
    }

    /// Execute the request and parse the response body into `T`.
    ///
    /// An empty body is parsed as JSON `null`, so `T` may be `()` or an `Option`.
    pub async fn call(self) -> Result<T, ApiError> {
        if let Some(error) = self.error {
            return Err(ApiError::Validation(error));
        }

        let body = self.client.execute(&self.request).await?;

        let parsed = if body.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_value(Value::Null)
        } else {
            serde_json::from_slice(&body)
        };

        parsed.map_err(|error| ApiError::ParseError(error.to_string()))
    }
}

impl ApiClient {
    pub(crate) async fn execute(&self, request: &PendingRequest) -> Result<Vec<u8>, ApiError> {
        let messages = &self.config.error_messages;
        let mut sends_left = request.max_attempts.max(1);
        let mut refreshed = false;

        loop {
            let token = if request.authenticated {
                self.token_store.access_token()
            } else {
                None
            };

            let response = match self.send(request, token.as_deref()).await {
                Ok(response) => response,
                Err(error) if error.is_builder() => {
                    return Err(ApiError::Validation(error.to_string()));
                }
                Err(error) => {
                    sends_left -= 1;
                    if sends_left == 0 {
                        warn!(method = %request.method, path = %request.path, error = %error, "giving up after network errors");
                        return Err(ApiError::network(messages, &error));
                    }

                    warn!(
                        method = %request.method,
                        path = %request.path,
                        error = %error,
                        sends_left,
                        "network error, retrying"
                    );
                    tokio::time::sleep(self.config.retry_backoff()).await;
                    continue;
                }
            };

            let status = response.status();
            if self.config.debug {
                debug!(method = %request.method, path = %request.path, %status, "response received");
            }

            if status.is_success() {
                return response
                    .bytes()
                    .await
                    .map(|body| body.to_vec())
                    .map_err(|error| ApiError::network(messages, &error));
            }

            if status == StatusCode::UNAUTHORIZED && request.authenticated && !refreshed {
                refreshed = true;
                self.recover_session(token.as_deref()).await?;
                continue;
            }

            let payload = read_payload(response).await;

            return Err(normalize(status.as_u16(), payload, messages));
        }
    }

    async fn send(
        &self,
        request: &PendingRequest,
        token: Option<&str>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let url = self.endpoint(&request.path);

        let mut request_builder = self
            .reqwest_client
            .request(request.method.into(), &url)
            .header(ACCEPT, "application/json")
            .headers(request.headers.clone());

        if !request.query.is_empty() {
            request_builder = request_builder.query(&request.query);
        }

        if let Some(body) = &request.body {
            request_builder = request_builder.json(body);
        }

        if let Some(token) = token {
            request_builder = request_builder.bearer_auth(token);
        }

        if self.config.debug {
            debug!(method = %request.method, %url, authenticated = token.is_some(), "sending request");
        }

        request_builder.send().await
    }
}

/// Reads an error response body: JSON when possible, raw text otherwise.
pub(crate) async fn read_payload(response: reqwest::Response) -> Option<Value> {
    let body = response.bytes().await.ok()?;

    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    Some(serde_json::from_slice(&body).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&body).into_owned())
    }))
}
