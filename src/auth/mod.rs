use serde::Deserialize;
use serde_json::Value;

pub mod login;
pub mod refresh;
pub mod token_store;

/// Token pair returned by the refresh endpoint.
///
/// The endpoint may omit `refreshToken`, in which case the stored one is kept.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// The new access token.
    pub token: String,
    /// The new refresh token, if the API rotated it.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("token", &"***REDACTED***")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "***REDACTED***"),
            )
            .finish()
    }
}

/// Successful login response.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// The access token.
    pub token: String,
    /// The refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Identity of the logged-in user, as sent by the API.
    #[serde(default)]
    pub user: Option<Value>,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("token", &"***REDACTED***")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "***REDACTED***"),
            )
            .field("user", &self.user)
            .finish()
    }
}

/// Session lifecycle notifications, see [`ApiClient::subscribe`](crate::ApiClient::subscribe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Tokens were stored by a successful login.
    LoggedIn,
    /// Tokens were replaced by a successful refresh.
    Refreshed,
    /// Tokens were cleared by an explicit logout.
    LoggedOut,
    /// The session could not be refreshed and the tokens were cleared.
    ///
    /// The host application should navigate to `login_path`.
    Expired {
        /// Configured login entry point.
        login_path: String,
    },
}
