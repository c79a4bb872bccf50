use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs;
use tracing::debug;

use crate::cache::credential::{Credential, AUTH_CACHE_NAME};
use crate::cache::credential_cache::CredentialCache;
use crate::error::{Error, Result};

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// File name of the access token entry, shared with existing deployments
pub const AUTH_FILE_NAME: &str = ".auth_file";

/// Credential cache persisted as one JSON file per name (`<dir>/.<name>`,
/// `<dir>/.auth_file` for the access token).
///
/// Writes go to a unique temp file first and are renamed into place, so a
/// reader never sees a half-written entry and different names never touch
/// the same file.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        match name {
            AUTH_CACHE_NAME => self.dir.join(AUTH_FILE_NAME),
            other => self.dir.join(format!(".{}", other)),
        }
    }
}

impl CredentialCache for FileCache {
    async fn get(&self, name: &str) -> Result<Credential> {
        let path = self.path_for(name);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(Error::NotFound(name.to_owned())),
            Err(err) => return Err(storage_error(name, err)),
        };

        let credential: Credential = serde_json::from_slice(&raw)
            .map_err(|err| storage_error(name, std::io::Error::new(ErrorKind::InvalidData, err)))?;

        if !credential.is_valid() {
            debug!("cache entry '{}' expired at {}", name, credential.expires_at());
            return Err(Error::Expired(name.to_owned()));
        }
        Ok(credential)
    }

    async fn set(&self, name: &str, credential: &Credential) -> Result<()> {
        let path = self.path_for(name);
        let content = serde_json::to_vec(credential)
            .map_err(|err| storage_error(name, std::io::Error::new(ErrorKind::InvalidData, err)))?;

        fs::create_dir_all(&self.dir).await.map_err(|err| storage_error(name, err))?;

        let tmp = tmp_path(&path);
        write_private(&tmp, &content).await.map_err(|err| storage_error(name, err))?;
        if let Err(err) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(storage_error(name, err));
        }
        debug!("cache entry '{}' written to {}", name, path.display());
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.{}.tmp", std::process::id(), seq));
    path.with_file_name(name)
}

async fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    fs::write(path, content).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }
    Ok(())
}

fn storage_error(name: &str, source: std::io::Error) -> Error {
    Error::Storage { name: name.to_owned(), source }
}
