//! Latest-message selection
//!
//! Given raw messages already ordered newest first, finds the first
//! one addressed to the requested recipient and parses it into an
//! [`Email`]. Because the caller ordered the candidates, "first match"
//! and "latest match" are the same thing.

use tracing::debug;

use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::message::Email;
use crate::mime::walk_multipart;
use crate::store::RawBlob;

/// Scan `blobs` in order and build the first message whose `To`
/// header contains `recipient`.
///
/// Returns `Ok(None)` when nothing matches. Candidates that do not
/// match are skipped cheaply after the envelope check; their bodies
/// are never parsed.
///
/// # Errors
///
/// Any candidate with an unreadable header block is fatal, matching
/// or not. A matched message must be `multipart/*` and carry a
/// boundary parameter; decoding errors inside its parts propagate
/// unchanged.
pub fn find_latest(blobs: &[RawBlob], recipient: &str, max_depth: usize) -> Result<Option<Email>> {
    for blob in blobs {
        debug!("examining {}", blob.key);
        let envelope = Envelope::parse(&blob.body)?;
        if !envelope.is_addressed_to(recipient) {
            continue;
        }
        debug!("{} is addressed to {}", blob.key, recipient);

        let content_type = mailparse::parse_content_type(&envelope.content_type);
        if !content_type.mimetype.starts_with("multipart/") {
            return Err(Error::Parse("email is not multipart".to_string()));
        }
        let boundary = content_type
            .params
            .get("boundary")
            .ok_or_else(|| Error::Parse("multipart message has no boundary".to_string()))?;

        let body = envelope.body(&blob.body);
        let mut email = envelope.into_email();
        walk_multipart(body, boundary, &mut email, max_depth)?;
        return Ok(Some(email));
    }

    Ok(None)
}
