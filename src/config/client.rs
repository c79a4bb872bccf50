use std::path::PathBuf;

use serde::Deserialize;

pub const BASE_URL: &str = "https://oapi.dingtalk.com/";
pub const LEGACY_BASE_URL: &str = "https://eco.taobao.com/router/rest";
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

/// ================================
/// DingTalk client settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub corp_id: String,
    pub corp_secret: String,
    /// Reported back in the JS-API handshake mapping
    #[serde(default)]
    pub agent_id: String,
    /// Standard (JSON/REST) dialect endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// LegacySigned (form RPC) dialect endpoint
    #[serde(default = "default_legacy_url")]
    pub legacy_url: String,
    /// Bounds every network call, there is no per-call override
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl ClientConfig {
    pub fn new(corp_id: impl Into<String>, corp_secret: impl Into<String>) -> Self {
        Self {
            corp_id: corp_id.into(),
            corp_secret: corp_secret.into(),
            agent_id: String::new(),
            base_url: default_base_url(),
            legacy_url: default_legacy_url(),
            timeout_ms: default_timeout_ms(),
            cache: CacheConfig::default(),
        }
    }

    pub fn with_endpoints(mut self, base_url: impl Into<String>, legacy_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self.legacy_url = legacy_url.into();
        self
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    #[default]
    File,
    Memory,
}

/// Backing store of the cached credentials
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default)]
    pub kind: CacheKind,
    /// Directory of the credential files (kind = file)
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { kind: CacheKind::default(), dir: default_cache_dir() }
    }
}

fn default_base_url() -> String {
    BASE_URL.to_string()
}

fn default_legacy_url() -> String {
    LEGACY_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".")
}
