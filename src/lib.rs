//! `marketplace-client` is an authenticated Rust client for the home-services
//! marketplace REST API.
//!
//! Requests carry the stored access token. When the API answers 401 the
//! client exchanges the refresh token for a new pair exactly once and re-sends
//! the request; when that fails the tokens are cleared and a
//! [`SessionEvent::Expired`] is broadcast so the host application can send the
//! user back to its login screen. Requests that get no response at all are
//! retried a bounded number of times with a fixed backoff when they are
//! idempotent.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::error::Error;
//!
//! use marketplace_client::{ApiClient, ClientConfig, SessionEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn Error>> {
//!     let client = ApiClient::new(ClientConfig::new("https://api.example.com/api"))?;
//!
//!     let mut events = client.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let SessionEvent::Expired { login_path } = event {
//!                 println!("session expired, go to {login_path}");
//!             }
//!         }
//!     });
//!
//!     client.login("customer@example.com", "YOUR_PASSWORD").await?;
//!
//!     let bookings = client.bookings().list(None).await?;
//!
//!     for booking in bookings.items {
//!         println!("{} on {}: {}", booking.service, booking.scheduled_at, booking.total_cost);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

pub use auth::token_store::{
    ACCESS_TOKEN_KEY, FileTokenStore, MemoryTokenStore, REFRESH_TOKEN_KEY, StoredSession,
    TokenStore, USER_KEY,
};
pub use auth::{AuthResponse, SessionEvent, TokenPair};
pub use config::{ClientConfig, ErrorMessages};
pub use error::*;
pub use request::{Method, RequestBuilder};
pub use resources::Page;
pub use resources::bookings::{Booking, BookingDraft, BookingStatus, Bookings, MAX_BOOKING_HOURS};
pub use resources::reviews::{NewReview, Review, Reviews, average_rating};
pub use resources::workers::{ProfileUpdate, Worker, Workers, WorkersListBuilder};
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, broadcast};

pub(crate) mod auth;
pub mod config;
pub mod error;
pub(crate) mod request;
pub(crate) mod resources;

const SESSION_EVENT_CAPACITY: usize = 16;

/// A client for the marketplace REST API.
///
/// Cloning is cheap: clones share the token store, the connection pool and
/// the session event channel.
///
/// The `Debug` implementation for this struct does not print any token.
///
/// # Example
/// ```rust,ignore
/// use std::sync::Arc;
/// use marketplace_client::{ApiClient, ClientConfig, FileTokenStore};
///
/// let store = Arc::new(FileTokenStore::open("session.json")?);
/// let client = ApiClient::with_token_store(ClientConfig::from_file("client.yaml")?, store)?;
///
/// let worker = client.workers().get("worker_42").await?;
/// ```
#[derive(Clone)]
pub struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) token_store: Arc<dyn TokenStore>,
    pub(crate) reqwest_client: reqwest::Client,
    pub(crate) events: broadcast::Sender<SessionEvent>,
    pub(crate) refresh_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.is_authenticated())
            .field("config", &self.config)
            .field("reqwest_client", &"Client")
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client keeping its tokens in memory.
    ///
    /// # Example
    /// ```rust,ignore
    /// let client = ApiClient::new(ClientConfig::new("http://localhost:8080/api"))?;
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        Self::with_token_store(config, Arc::new(MemoryTokenStore::new()))
    }

    /// Creates a client using `token_store` as its source of truth for tokens.
    pub fn with_token_store(
        config: ClientConfig,
        token_store: Arc<dyn TokenStore>,
    ) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Self::with_client(config, token_store, client)
    }

    /// Creates a client with a custom reqwest client.
    ///
    /// The timeouts of `config` are not applied to `client`.
    ///
    /// # Example
    /// ```rust,ignore
    /// use std::time::Duration;
    ///
    /// let reqwest_client = reqwest::Client::builder()
    ///     .timeout(Duration::from_secs(60))
    ///     .user_agent("marketplace-admin/1.0")
    ///     .build()?;
    ///
    /// let client = ApiClient::with_client(config, Arc::new(MemoryTokenStore::new()), reqwest_client)?;
    /// ```
    pub fn with_client(
        config: ClientConfig,
        token_store: Arc<dyn TokenStore>,
        client: reqwest::Client,
    ) -> Result<Self, ConfigError> {
        let base_url = config.normalized_base_url()?;
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);

        Ok(Self {
            base_url,
            config: Arc::new(config),
            token_store,
            reqwest_client: client,
            events,
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Returns the base URL every request path is relative to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the configuration the client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the token store shared by every clone of this client.
    #[must_use]
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.token_store
    }

    /// Subscribes to session lifecycle events.
    ///
    /// Events emitted before the call are not delivered.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscriber is not an error.
        let _ = self.events.send(event);
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl ApiClient {
    /// Starts a request to `path`, relative to the base URL.
    ///
    /// Nothing is sent until [`RequestBuilder::call`] is awaited. The stored
    /// access token is attached on every send, and a `401` triggers a single
    /// session refresh before the request is sent again.
    ///
    /// # Arguments
    /// * `method` - The HTTP method of the request.
    /// * `path` - The endpoint, relative to [`ClientConfig::base_url`].
    ///
    /// # Returns
    /// A [`RequestBuilder`] whose `call()` parses the response body into `T`.
    ///
    /// # Example
    /// ```rust,ignore
    /// let summary: serde_json::Value = client
    ///     .request(Method::Get, "/admin/dashboard")
    ///     .query("range", "30d")
    ///     .call()
    ///     .await?;
    /// ```
    pub fn request<T: DeserializeOwned>(&self, method: Method, path: &str) -> RequestBuilder<'_, T> {
        RequestBuilder::new(self, method, path)
    }

    /// Starts a `GET` request, see [`ApiClient::request`].
    ///
    /// Network errors are retried up to [`ClientConfig::retry_attempts`] sends.
    ///
    /// # Example
    /// ```rust,ignore
    /// let booking: Booking = client.get("/bookings/b1").call().await?;
    /// ```
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> RequestBuilder<'_, T> {
        self.request(Method::Get, path)
    }

    /// Starts a `POST` request, see [`ApiClient::request`].
    ///
    /// Sent once on network errors unless [`RequestBuilder::retries`] raises
    /// the budget.
    ///
    /// # Example
    /// ```rust,ignore
    /// let review: Review = client
    ///     .post("/reviews")
    ///     .json(&new_review)
    ///     .call()
    ///     .await?;
    /// ```
    pub fn post<T: DeserializeOwned>(&self, path: &str) -> RequestBuilder<'_, T> {
        self.request(Method::Post, path)
    }

    /// Starts a `PUT` request.
    pub fn put<T: DeserializeOwned>(&self, path: &str) -> RequestBuilder<'_, T> {
        self.request(Method::Put, path)
    }

    /// Starts a `PATCH` request. Like `POST`, it is sent once on network errors.
    pub fn patch<T: DeserializeOwned>(&self, path: &str) -> RequestBuilder<'_, T> {
        self.request(Method::Patch, path)
    }

    /// Starts a `DELETE` request.
    pub fn delete<T: DeserializeOwned>(&self, path: &str) -> RequestBuilder<'_, T> {
        self.request(Method::Delete, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_paths() {
        let client = ApiClient::new(ClientConfig::new("http://localhost:8080/api/")).unwrap();

        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(
            client.endpoint("/bookings"),
            "http://localhost:8080/api/bookings"
        );
        assert_eq!(
            client.endpoint("workers/1"),
            "http://localhost:8080/api/workers/1"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            ApiClient::new(ClientConfig::new("localhost:8080")),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn debug_output_hides_tokens() {
        let store = Arc::new(MemoryTokenStore::with_tokens("secret-access", Some("secret-refresh")));
        let client =
            ApiClient::with_token_store(ClientConfig::new("http://localhost:8080"), store).unwrap();
        let output = format!("{client:?}");

        assert!(output.contains("authenticated: true"));
        assert!(!output.contains("secret-access"));
    }
}
