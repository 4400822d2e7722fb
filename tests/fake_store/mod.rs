//! In-memory stores for integration testing
//!
//! Provides a builder-style API for seeding a message drop:
//!
//! ```ignore
//! let drop = MailDropBuilder::new()
//!     .message("msg-1", ts("2020-01-06T10:00:00Z"), &raw_rfc2822_bytes)
//!     .message("msg-2", ts("2020-01-06T10:05:00Z"), &raw_rfc2822_bytes)
//!     .build();
//! ```
//!
//! Both stores count their calls so tests can assert not just what
//! the engine returned but which collaborators it touched: the auth
//! short-circuit must never fetch the secret, and a filtered-out
//! candidate must never be fetched.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use letterbox::{Error, ObjectMeta, ObjectStore, RawBlob, Result, SecretStore};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A fixed in-memory message drop with list/fetch call counters.
pub struct MemoryObjectStore {
    objects: Vec<(ObjectMeta, Vec<u8>)>,
    lists: AtomicUsize,
    fetches: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn list_calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(&self) -> Result<Vec<ObjectMeta>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        Ok(self.objects.iter().map(|(meta, _)| meta.clone()).collect())
    }

    async fn fetch(&self, key: &str) -> Result<RawBlob> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.objects
            .iter()
            .find(|(meta, _)| meta.key == key)
            .map(|(meta, body)| RawBlob {
                key: meta.key.clone(),
                body: body.clone(),
            })
            .ok_or_else(|| Error::Store(format!("no such object {key}")))
    }
}

/// Builder for seeding a [`MemoryObjectStore`] message by message.
pub struct MailDropBuilder {
    objects: Vec<(ObjectMeta, Vec<u8>)>,
}

impl MailDropBuilder {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    /// Add a message under `key` with the given last-modified stamp.
    pub fn message(mut self, key: &str, last_modified: DateTime<Utc>, raw: &[u8]) -> Self {
        self.objects.push((
            ObjectMeta {
                key: key.to_string(),
                last_modified,
            },
            raw.to_vec(),
        ));
        self
    }

    /// Consume the builder and return the finished store.
    pub fn build(self) -> MemoryObjectStore {
        MemoryObjectStore {
            objects: self.objects,
            lists: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }
}

/// A secret backend holding one value, or none to fail hard.
pub struct MemorySecretStore {
    secret: Option<String>,
    fetches: AtomicUsize,
}

impl MemorySecretStore {
    pub fn with_secret(secret: &str) -> Self {
        Self {
            secret: Some(secret.to_string()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// A store whose every fetch fails, for exercising the error
    /// path distinct from "wrong secret".
    pub fn failing() -> Self {
        Self {
            secret: None,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn fetch(&self, name: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.secret
            .clone()
            .ok_or_else(|| Error::Secret(format!("{name} unavailable")))
    }
}
