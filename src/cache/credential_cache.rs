use std::future::Future;

use crate::cache::credential::Credential;
use crate::error::Result;

/// Storage contract for cached credentials, one entry per cache name.
///
/// `get` fails with `Error::NotFound` when no entry exists and with
/// `Error::Expired` when the stored entry's TTL has elapsed at read time.
/// `set` overwrites the entry and fails with `Error::Storage` when the
/// backend cannot persist it. Entries are never deleted, only superseded.
pub trait CredentialCache: Send + Sync {
    fn get(&self, name: &str) -> impl Future<Output = Result<Credential>> + Send;

    fn set(&self, name: &str, credential: &Credential) -> impl Future<Output = Result<()>> + Send;
}
