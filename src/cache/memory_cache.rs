use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::cache::credential::Credential;
use crate::cache::credential_cache::CredentialCache;
use crate::error::{Error, Result};

/// Process-local credential cache: name -> credential
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    inner: Arc<RwLock<HashMap<String, Credential>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }
}

impl CredentialCache for MemoryCache {
    async fn get(&self, name: &str) -> Result<Credential> {
        let map = self.inner.read().await;
        map.get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_owned()))
            .and_then(|credential| match credential.is_valid() {
                true => Ok(credential),
                false => Err(Error::Expired(name.to_owned())),
            })
    }

    async fn set(&self, name: &str, credential: &Credential) -> Result<()> {
        let mut map = self.inner.write().await;
        map.insert(name.to_string(), credential.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::time::now_i64;

    #[tokio::test]
    async fn get_after_set_honours_ttl() {
        let cache = MemoryCache::new();
        let now = now_i64();

        assert!(matches!(cache.get("auth").await, Err(Error::NotFound(_))));

        let fresh = Credential { value: "tok".into(), created_at: now, ttl_seconds: 60 };
        cache.set("auth", &fresh).await.unwrap();
        assert_eq!(cache.get("auth").await.unwrap().value, "tok");

        // created 60s ago with a 60s ttl: now == created_at + ttl
        let stale = Credential { value: "old".into(), created_at: now - 60, ttl_seconds: 60 };
        cache.set("auth", &stale).await.unwrap();
        assert!(matches!(cache.get("auth").await, Err(Error::Expired(_))));
    }

    #[tokio::test]
    async fn names_are_independent() {
        let cache = MemoryCache::new();
        let token = Credential::issued_now("tok".into(), 60);
        let ticket = Credential::issued_now("ticket".into(), 60);

        let (a, b) = tokio::join!(cache.set("auth", &token), cache.set("jsapi_ticket", &ticket));
        a.unwrap();
        b.unwrap();

        assert_eq!(cache.get("auth").await.unwrap().value, "tok");
        assert_eq!(cache.get("jsapi_ticket").await.unwrap().value, "ticket");
    }
}
