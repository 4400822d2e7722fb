//! Receive-email facade

use crate::auth;
use crate::error::Result;
use crate::message::Email;
use crate::poll::{PollConfig, poll_for_message};
use crate::store::{ObjectStore, SecretStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Polling mail receiver over pluggable object and secret stores
///
/// Both collaborators are injected, so the same facade runs against a
/// local maildrop in production and in-memory fakes in tests.
pub struct Letterbox {
    objects: Arc<dyn ObjectStore>,
    secrets: Arc<dyn SecretStore>,
    secret_name: String,
    poll: PollConfig,
}

impl Letterbox {
    #[must_use]
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        secrets: Arc<dyn SecretStore>,
        secret_name: impl Into<String>,
        poll: PollConfig,
    ) -> Self {
        Self {
            objects,
            secrets,
            secret_name: secret_name.into(),
            poll,
        }
    }

    /// Check an inbound `Authorization` header value against the
    /// shared secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret itself cannot be fetched; a
    /// wrong or missing header is `Ok(false)`, not an error.
    pub async fn authorize(&self, header: Option<&str>) -> Result<bool> {
        auth::authorize(header, &self.secret_name, self.secrets.as_ref()).await
    }

    /// Wait for the most recent message addressed to `recipient` that
    /// was received strictly after `received_after`.
    ///
    /// Polls the object store on the configured cadence and gives up
    /// with `Ok(None)` once the configured deadline elapses.
    ///
    /// # Errors
    ///
    /// Returns an error if listing or fetching from the store fails,
    /// or if a candidate message cannot be parsed.
    pub async fn receive(
        &self,
        recipient: &str,
        received_after: DateTime<Utc>,
    ) -> Result<Option<Email>> {
        debug!("receive request for {recipient} after {received_after}");
        let found =
            poll_for_message(self.objects.as_ref(), &self.poll, recipient, received_after).await?;
        if found.is_some() {
            info!("found message for {recipient}");
        }
        Ok(found)
    }
}
