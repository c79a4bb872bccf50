//! Shared client state.
//!
//! A [`DingTalkClient`] is cheap to clone and meant to be shared between
//! tasks. It owns the HTTP client, the credential cache and [`TokenState`],
//! the only mutable state of the crate.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::{Mutex, RwLock};

use crate::cache::credential_cache::CredentialCache;
use crate::cache::CacheBackend;
use crate::config::client::ClientConfig;
use crate::error::Result;

/// Current access token plus the guards of the refresh critical sections.
///
/// `current` starts empty, is written only while `refresh_guard` is held
/// (or on a cache hit) and is read by every Standard/LegacySigned dispatch.
#[derive(Debug, Default)]
pub struct TokenState {
    current: RwLock<String>,
    pub(crate) refresh_guard: Mutex<()>,
    pub(crate) ticket_guard: Mutex<()>,
}

impl TokenState {
    pub async fn current(&self) -> String {
        self.current.read().await.clone()
    }

    pub(crate) async fn replace(&self, value: String) {
        *self.current.write().await = value;
    }
}

struct ClientInner<C> {
    config: ClientConfig,
    http: Client,
    cache: C,
    token: TokenState,
}

/// DingTalk open API client
pub struct DingTalkClient<C = CacheBackend> {
    inner: Arc<ClientInner<C>>,
}

impl<C> Clone for DingTalkClient<C> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl DingTalkClient<CacheBackend> {
    /// Client backed by the cache selected in `config.cache`
    pub fn new(config: ClientConfig) -> Result<Self> {
        let cache = CacheBackend::from_config(&config.cache);
        Self::with_cache(config, cache)
    }
}

impl<C: CredentialCache> DingTalkClient<C> {
    pub fn with_cache(config: ClientConfig, cache: C) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner { config, http, cache, token: TokenState::default() }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &C {
        &self.inner.cache
    }

    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    pub(crate) fn token_state(&self) -> &TokenState {
        &self.inner.token
    }

    /// Access token currently mirrored in the client, empty before the first refresh
    pub async fn current_token(&self) -> String {
        self.inner.token.current().await
    }
}
