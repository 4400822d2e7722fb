//! Deadline-bounded polling
//!
//! A requested message may not have landed in the store yet when the
//! request arrives, so the poller re-runs the fetch-and-select cycle
//! on a fixed cadence until something matches or the wall-clock
//! deadline runs out. Only the "nothing there yet" outcome is
//! retried; storage and parse failures abort the whole operation on
//! the spot.

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::debug;

use crate::error::Result;
use crate::message::Email;
use crate::mime::DEFAULT_MAX_DEPTH;
use crate::select::find_latest;
use crate::store::ObjectStore;

/// Timing and parsing limits for one polling run.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Total wall-clock budget for the run.
    pub deadline: std::time::Duration,
    /// Pause between consecutive attempts.
    pub interval: std::time::Duration,
    /// Multipart nesting cap handed to the MIME walk.
    pub max_depth: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            deadline: std::time::Duration::from_secs(25),
            interval: std::time::Duration::from_secs(1),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Poll `store` until a message addressed to `recipient` and received
/// strictly after `received_after` appears, or the deadline elapses.
///
/// Each attempt lists the store, keeps only objects modified after
/// the cutoff, fetches them newest first, and hands them to the
/// selector. Returns `Ok(None)` once the deadline is exceeded with no
/// match.
///
/// # Errors
///
/// Propagates the first storage or parse error unchanged; hard
/// errors are never retried.
pub async fn poll_for_message(
    store: &dyn ObjectStore,
    config: &PollConfig,
    recipient: &str,
    received_after: DateTime<Utc>,
) -> Result<Option<Email>> {
    let deadline = Instant::now() + config.deadline;
    while Instant::now() < deadline {
        if let Some(email) = poll_once(store, recipient, received_after, config.max_depth).await? {
            return Ok(Some(email));
        }
        tokio::time::sleep(config.interval).await;
    }
    debug!("no message for {recipient} within the deadline");
    Ok(None)
}

/// One fetch-and-select attempt.
///
/// When nothing survives the cutoff filter, the selector is not
/// invoked at all and no object bodies are fetched.
async fn poll_once(
    store: &dyn ObjectStore,
    recipient: &str,
    received_after: DateTime<Utc>,
    max_depth: usize,
) -> Result<Option<Email>> {
    let mut listing = store.list().await?;
    let total = listing.len();
    listing.retain(|meta| meta.last_modified > received_after);
    // Newest first, so the selector's first match is the most recent.
    listing.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
    debug!(
        "{} of {total} stored objects newer than {received_after}",
        listing.len()
    );

    if listing.is_empty() {
        return Ok(None);
    }

    let mut blobs = Vec::with_capacity(listing.len());
    for meta in &listing {
        blobs.push(store.fetch(&meta.key).await?);
    }
    find_latest(&blobs, recipient, max_depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::{ObjectMeta, RawBlob};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn quick() -> PollConfig {
        PollConfig {
            deadline: Duration::from_millis(120),
            interval: Duration::from_millis(10),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    fn ts(sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, sec).unwrap()
    }

    fn multipart_for(recipient: &str, text: &str) -> Vec<u8> {
        format!(
            "From: sender@example.com\r\n\
             To: {recipient}\r\n\
             Subject: hi\r\n\
             Content-Type: multipart/mixed; boundary=xyz\r\n\
             \r\n\
             --xyz\r\n\
             Content-Type: text/plain\r\n\
             \r\n\
             {text}\r\n\
             --xyz--\r\n"
        )
        .into_bytes()
    }

    #[derive(Default)]
    struct FakeStore {
        objects: Vec<(ObjectMeta, Vec<u8>)>,
        fail_list: bool,
        fail_fetch: bool,
        /// Number of list calls that see an empty store before the
        /// objects become visible.
        visible_after: usize,
        lists: AtomicUsize,
        fetches: AtomicUsize,
    }

    impl FakeStore {
        fn with(mut self, key: &str, modified: DateTime<Utc>, body: Vec<u8>) -> Self {
            self.objects.push((
                ObjectMeta {
                    key: key.to_string(),
                    last_modified: modified,
                },
                body,
            ));
            self
        }
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn list(&self) -> Result<Vec<ObjectMeta>> {
            let seen = self.lists.fetch_add(1, Ordering::SeqCst);
            if self.fail_list {
                return Err(Error::Store("listing offline".to_string()));
            }
            if seen < self.visible_after {
                return Ok(Vec::new());
            }
            Ok(self.objects.iter().map(|(meta, _)| meta.clone()).collect())
        }

        async fn fetch(&self, key: &str) -> Result<RawBlob> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetch {
                return Err(Error::Store("fetch offline".to_string()));
            }
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

    #[tokio::test]
    async fn finds_message_on_first_attempt() {
        let store = FakeStore::default().with(
            "msg-1",
            ts(10),
            multipart_for("alice@example.com", "hello"),
        );

        let email = poll_for_message(&store, &quick(), "alice@example.com", ts(0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(email.text_body, "hello");
        assert_eq!(store.lists.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unsorted_listing_still_picks_most_recent() {
        // Listed oldest first; the poller must sort descending itself.
        let store = FakeStore::default()
            .with("old", ts(5), multipart_for("alice@example.com", "older"))
            .with("new", ts(20), multipart_for("alice@example.com", "newer"));

        let email = poll_for_message(&store, &quick(), "alice@example.com", ts(0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(email.text_body, "newer");
    }

    #[tokio::test]
    async fn cutoff_is_strictly_after() {
        let store = FakeStore::default().with(
            "msg-1",
            ts(10),
            multipart_for("alice@example.com", "boundary case"),
        );

        // Equal timestamps do not qualify, and with nothing to fetch
        // the selector never runs.
        let found = poll_for_message(&store, &quick(), "alice@example.com", ts(10))
            .await
            .unwrap();
        assert!(found.is_none());
        assert_eq!(store.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn keeps_retrying_until_deadline_then_gives_up() {
        let store = FakeStore::default();
        let found = poll_for_message(&store, &quick(), "alice@example.com", ts(0))
            .await
            .unwrap();
        assert!(found.is_none());
        assert!(store.lists.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn listing_failure_aborts_without_retry() {
        let store = FakeStore {
            fail_list: true,
            ..FakeStore::default()
        };

        let err = poll_for_message(&store, &quick(), "alice@example.com", ts(0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert_eq!(store.lists.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_without_retry() {
        let store = FakeStore {
            fail_fetch: true,
            ..FakeStore::default()
        }
        .with("msg-1", ts(10), multipart_for("alice@example.com", "hi"));

        let err = poll_for_message(&store, &quick(), "alice@example.com", ts(0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn parse_failure_aborts_without_retry() {
        let store =
            FakeStore::default().with("broken", ts(10), b"no colon here\r\n\r\nbody".to_vec());

        let err = poll_for_message(&store, &quick(), "alice@example.com", ts(0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(store.lists.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn message_arriving_mid_poll_is_found() {
        // Invisible for the first two attempts, so only a loop that
        // re-lists the store can find it.
        let store = FakeStore {
            visible_after: 2,
            ..FakeStore::default()
        }
        .with(
            "late",
            ts(10),
            multipart_for("alice@example.com", "made it"),
        );
        let config = PollConfig {
            deadline: Duration::from_millis(500),
            interval: Duration::from_millis(1),
            max_depth: DEFAULT_MAX_DEPTH,
        };

        let email = poll_for_message(&store, &config, "alice@example.com", ts(0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(email.text_body, "made it");
        assert!(store.lists.load(Ordering::SeqCst) >= 3);
    }
}
