use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use super::{AuthResponse, SessionEvent};
use crate::ApiClient;
use crate::error::ApiError;

#[derive(Serialize)]
struct Credentials<'a> {
    identity: &'a str,
    password: &'a str,
}

impl ApiClient {
    /// Authenticate with an **email**/**phone** identity and a **password**.
    ///
    /// On success the previous session is discarded, then the token pair and
    /// the user identity are stored and used for subsequent requests.
    ///
    /// # Example
    /// ```rust,ignore
    /// let auth = client
    ///     .login("customer@example.com", "YOUR_PASSWORD")
    ///     .await?;
    ///
    /// println!("Logged in as {:?}", auth.user);
    /// ```
    pub async fn login(&self, identity: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let identity = identity.trim();

        match (identity.is_empty(), password.is_empty()) {
            (true, true) => {
                return Err(ApiError::Validation(
                    "Identity and password cannot be empty.".to_string(),
                ));
            }
            (true, false) => {
                return Err(ApiError::Validation("Identity cannot be empty.".to_string()));
            }
            (false, true) => {
                return Err(ApiError::Validation("Password cannot be empty.".to_string()));
            }
            (false, false) => {}
        }

        // Wrong credentials answer 401, which must not trigger a refresh.
        let auth = self
            .post::<AuthResponse>(&self.config.login_endpoint)
            .json(&Credentials { identity, password })
            .anonymous()
            .call()
            .await?;

        // Nothing of a previous session may outlive a new login.
        self.token_store.clear();
        self.token_store
            .set_tokens(&auth.token, auth.refresh_token.as_deref());
        if let Some(user) = &auth.user {
            self.token_store.set_user(user.clone());
        }

        info!("logged in");
        self.emit(SessionEvent::LoggedIn);

        Ok(auth)
    }

    /// Forget the current session.
    ///
    /// Clears the stored tokens and user identity, then emits
    /// [`SessionEvent::LoggedOut`].
    pub fn logout(&self) {
        self.token_store.clear();

        info!("logged out");
        self.emit(SessionEvent::LoggedOut);
    }

    /// Whether an access token is currently stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token_store.access_token().is_some()
    }

    /// Cached identity of the logged-in user, deserialized into `T`.
    ///
    /// Returns `None` when nothing is cached or when the cached value does not fit `T`.
    #[must_use]
    pub fn current_user<T: DeserializeOwned>(&self) -> Option<T> {
        self.token_store
            .user()
            .and_then(|user| serde_json::from_value(user).ok())
    }
}
