use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{SessionEvent, TokenPair};
use crate::ApiClient;
use crate::error::ApiError;
use crate::request::read_payload;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshPayload<'a> {
    refresh_token: &'a str,
}

impl ApiClient {
    /// Exchanges the stored refresh token for a new token pair.
    ///
    /// Requests issued through the client already do this on their own when
    /// they receive a 401; call it directly to validate a restored session on
    /// startup.
    ///
    /// On failure the stored tokens are cleared and
    /// [`SessionEvent::Expired`] is emitted.
    ///
    /// # Example
    /// ```rust,ignore
    /// let tokens = client.refresh().await?;
    /// ```
    pub async fn refresh(&self) -> Result<TokenPair, ApiError> {
        let _guard = self.refresh_lock.lock().await;

        self.refresh_locked().await
    }

    /// Recovers from a 401 received by a request sent with `sent_with`.
    ///
    /// Concurrent callers share a single refresh: whoever gets the lock after
    /// the token was already replaced only needs to re-send.
    pub(crate) async fn recover_session(&self, sent_with: Option<&str>) -> Result<(), ApiError> {
        let _guard = self.refresh_lock.lock().await;

        match (self.token_store.access_token(), sent_with) {
            (Some(current), _) if Some(current.as_str()) != sent_with => {
                debug!("access token already replaced by a concurrent refresh");
                Ok(())
            }
            (None, Some(_)) => {
                debug!("session already ended by a concurrent request");
                Err(ApiError::Authorization {
                    message: self.config.error_messages.unauthorized.clone(),
                    payload: None,
                })
            }
            _ => self.refresh_locked().await.map(|_| ()),
        }
    }

    // Must be called with `refresh_lock` held.
    async fn refresh_locked(&self) -> Result<TokenPair, ApiError> {
        let Some(refresh_token) = self.token_store.refresh_token() else {
            return Err(self.expire_session(None, "no refresh token stored"));
        };

        let url = self.endpoint(&self.config.refresh_path);

        // Sent without the rejected access token.
        let request = self
            .reqwest_client
            .post(&url)
            .json(&RefreshPayload {
                refresh_token: &refresh_token,
            })
            .send()
            .await;

        match request {
            Ok(response) if response.status().is_success() => {
                let Ok(tokens) = response.json::<TokenPair>().await else {
                    return Err(self.expire_session(None, "unparseable refresh response"));
                };

                self.token_store
                    .set_tokens(&tokens.token, tokens.refresh_token.as_deref());
                info!(rotated = tokens.refresh_token.is_some(), "session refreshed");
                self.emit(SessionEvent::Refreshed);

                Ok(tokens)
            }
            Ok(response) => {
                let status = response.status();
                let payload = read_payload(response).await;

                Err(self.expire_session(payload, &format!("refresh rejected with {status}")))
            }
            Err(error) => Err(self.expire_session(None, &error.to_string())),
        }
    }

    fn expire_session(&self, payload: Option<Value>, reason: &str) -> ApiError {
        warn!(reason, "session expired, clearing stored tokens");

        self.token_store.clear();
        self.emit(SessionEvent::Expired {
            login_path: self.config.login_path.clone(),
        });

        ApiError::Authorization {
            message: self.config.error_messages.unauthorized.clone(),
            payload,
        }
    }
}
