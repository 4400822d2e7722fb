//! Storage abstractions
//!
//! The polling and auth layers reach storage through two narrow
//! traits so callers can wire in whatever backend they deploy against
//! and tests can substitute in-memory fakes. The bundled
//! implementations cover the simplest real deployment: a maildrop
//! directory on local disk and secrets in the process environment.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// Listing entry for one stored message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

/// One fetched message: its key and raw RFC 5322 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlob {
    pub key: String,
    pub body: Vec<u8>,
}

/// Read-only access to the message drop.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every stored object with its last-modified instant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] when the backing store cannot be read.
    async fn list(&self) -> Result<Vec<ObjectMeta>>;

    /// Fetch one object's raw bytes by key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] when the object cannot be read.
    async fn fetch(&self, key: &str) -> Result<RawBlob>;
}

/// Access to the shared API secret.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the named secret's current value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Secret`] when the secret cannot be resolved.
    async fn fetch(&self, name: &str) -> Result<String>;
}

/// [`ObjectStore`] over a flat maildrop directory.
///
/// Every regular file directly under the root is one message; the
/// file name is its key and the filesystem mtime is its last-modified
/// instant. Subdirectories and other non-file entries are skipped.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn list(&self) -> Result<Vec<ObjectMeta>> {
        let mut dir = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| Error::Store(format!("list {}: {e}", self.root.display())))?;

        let mut out = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| Error::Store(format!("list {}: {e}", self.root.display())))?
        {
            let meta = entry
                .metadata()
                .await
                .map_err(|e| Error::Store(format!("stat {:?}: {e}", entry.file_name())))?;
            if !meta.is_file() {
                continue;
            }
            let modified = meta
                .modified()
                .map_err(|e| Error::Store(format!("mtime {:?}: {e}", entry.file_name())))?;
            out.push(ObjectMeta {
                key: entry.file_name().to_string_lossy().into_owned(),
                last_modified: DateTime::<Utc>::from(modified),
            });
        }
        Ok(out)
    }

    async fn fetch(&self, key: &str) -> Result<RawBlob> {
        let body = tokio::fs::read(self.root.join(key))
            .await
            .map_err(|e| Error::Store(format!("fetch {key}: {e}")))?;
        Ok(RawBlob {
            key: key.to_string(),
            body,
        })
    }
}

/// [`SecretStore`] backed by process environment variables; the
/// secret name is the variable name.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore;

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn fetch(&self, name: &str) -> Result<String> {
        std::env::var(name).map_err(|_| Error::Secret(format!("{name} is not set")))
    }
}
