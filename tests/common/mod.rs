#![allow(dead_code)]

use std::sync::Arc;

use httpmock::MockServer;
use marketplace_client::{ApiClient, ClientConfig, MemoryTokenStore, TokenStore};

pub const BACKOFF_MS: u64 = 50;

/// Configuration pointing at `server`, with a short backoff and timeout.
pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig {
        timeout_ms: 500,
        retry_backoff_ms: BACKOFF_MS,
        ..ClientConfig::new(&server.base_url())
    }
}

/// Client whose store already holds `access` / `refresh`.
pub fn client_with_tokens(
    server: &MockServer,
    access: Option<&str>,
    refresh: Option<&str>,
) -> (ApiClient, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::new());
    if let Some(access) = access {
        store.set_tokens(access, refresh);
    }

    let client = ApiClient::with_token_store(config_for(server), store.clone()).unwrap();

    (client, store)
}

/// Base URL of a port nothing listens on.
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    format!("http://127.0.0.1:{port}")
}
