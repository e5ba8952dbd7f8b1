use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TokenStoreError;

/// Storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "token";
/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Storage key of the cached user identity.
pub const USER_KEY: &str = "user";

/// Single source of truth for the current token pair.
///
/// An implementation is shared by every clone of an [`ApiClient`](crate::ApiClient),
/// so all methods take `&self` and synchronise internally.
pub trait TokenStore: Send + Sync {
    /// Current access token, if any.
    fn access_token(&self) -> Option<String>;

    /// Current refresh token, if any.
    fn refresh_token(&self) -> Option<String>;

    /// Overwrites the access token, and the refresh token only when one is given.
    ///
    /// Both values must be visible together to the next reader.
    fn set_tokens(&self, access: &str, refresh: Option<&str>);

    /// Removes both tokens and the cached user identity.
    fn clear(&self);

    /// Cached identity of the logged-in user.
    fn user(&self) -> Option<Value>;

    /// Caches the identity of the logged-in user.
    fn set_user(&self, user: Value);
}

/// Everything a [`TokenStore`] keeps, laid out with the well-known storage keys.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Access token.
    #[serde(rename = "token", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Refresh token.
    #[serde(
        rename = "refreshToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<String>,
    /// Cached user identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "***REDACTED***"),
            )
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "***REDACTED***"),
            )
            .field("user", &self.user)
            .finish()
    }
}

impl StoredSession {
    fn set_tokens(&mut self, access: &str, refresh: Option<&str>) {
        self.access_token = Some(access.to_string());
        if let Some(refresh) = refresh {
            self.refresh_token = Some(refresh.to_string());
        }
    }
}

/// In-process [`TokenStore`]. Tokens are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    state: RwLock<StoredSession>,
}

impl MemoryTokenStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store already holding a token pair.
    #[must_use]
    pub fn with_tokens(access: &str, refresh: Option<&str>) -> Self {
        let store = Self::default();
        store.set_tokens(access, refresh);
        store
    }

    /// Copy of the stored state.
    #[must_use]
    pub fn snapshot(&self) -> StoredSession {
        read(&self.state).clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<String> {
        read(&self.state).access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        read(&self.state).refresh_token.clone()
    }

    fn set_tokens(&self, access: &str, refresh: Option<&str>) {
        write(&self.state).set_tokens(access, refresh);
    }

    fn clear(&self) {
        *write(&self.state) = StoredSession::default();
    }

    fn user(&self) -> Option<Value> {
        read(&self.state).user.clone()
    }

    fn set_user(&self, user: Value) {
        write(&self.state).user = Some(user);
    }
}

/// [`TokenStore`] persisted as a JSON document on disk.
///
/// The in-memory copy is authoritative: a failed write is logged and the
/// process keeps using the new tokens.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    state: RwLock<StoredSession>,
}

impl FileTokenStore {
    /// Loads the session stored at `path`. A missing file is an empty session.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TokenStoreError> {
        let path = path.as_ref().to_path_buf();

        let state = match std::fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => StoredSession::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                StoredSession::default()
            }
            Err(error) => return Err(error.into()),
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    /// Location of the storage file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    // Called with the write lock held so concurrent writers persist in order.
    fn persist(&self, session: &StoredSession) {
        let result = if *session == StoredSession::default() {
            match std::fs::remove_file(&self.path) {
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            }
        } else {
            serde_json::to_vec_pretty(session)
                .map_err(std::io::Error::other)
                .and_then(|bytes| {
                    // The file is replaced as a whole so a crash never leaves it half written.
                    let staging = self.staging_path();
                    std::fs::write(&staging, bytes)?;
                    std::fs::rename(&staging, &self.path)
                })
        };

        if let Err(error) = result {
            tracing::warn!(path = %self.path.display(), error = %error, "could not persist token storage");
        }
    }
}

impl TokenStore for FileTokenStore {
    fn access_token(&self) -> Option<String> {
        read(&self.state).access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        read(&self.state).refresh_token.clone()
    }

    fn set_tokens(&self, access: &str, refresh: Option<&str>) {
        let mut state = write(&self.state);
        state.set_tokens(access, refresh);
        self.persist(&state);
    }

    fn clear(&self) {
        let mut state = write(&self.state);
        *state = StoredSession::default();
        self.persist(&state);
    }

    fn user(&self) -> Option<Value> {
        read(&self.state).user.clone()
    }

    fn set_user(&self, user: Value) {
        let mut state = write(&self.state);
        state.user = Some(user);
        self.persist(&state);
    }
}

// A panic while holding the lock cannot leave a half-written session behind,
// so poisoning is ignored.
fn read(lock: &RwLock<StoredSession>) -> RwLockReadGuard<'_, StoredSession> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(lock: &RwLock<StoredSession>) -> RwLockWriteGuard<'_, StoredSession> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
