pub mod credential;
pub mod credential_cache;
pub mod file_cache;
pub mod memory_cache;

use crate::cache::credential::Credential;
use crate::cache::credential_cache::CredentialCache;
use crate::cache::file_cache::FileCache;
use crate::cache::memory_cache::MemoryCache;
use crate::config::client::{CacheConfig, CacheKind};
use crate::error::Result;

/// Cache backend selected by configuration
#[derive(Debug, Clone)]
pub enum CacheBackend {
    File(FileCache),
    Memory(MemoryCache),
}

impl CacheBackend {
    pub fn from_config(cfg: &CacheConfig) -> Self {
        match cfg.kind {
            CacheKind::File => CacheBackend::File(FileCache::new(cfg.dir.clone())),
            CacheKind::Memory => CacheBackend::Memory(MemoryCache::new()),
        }
    }
}

impl CredentialCache for CacheBackend {
    async fn get(&self, name: &str) -> Result<Credential> {
        match self {
            CacheBackend::File(c) => c.get(name).await,
            CacheBackend::Memory(c) => c.get(name).await,
        }
    }

    async fn set(&self, name: &str, credential: &Credential) -> Result<()> {
        match self {
            CacheBackend::File(c) => c.set(name, credential).await,
            CacheBackend::Memory(c) => c.set(name, credential).await,
        }
    }
}
