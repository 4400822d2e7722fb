//! Envelope header parsing
//!
//! The selector only needs the top-level header block of each candidate
//! message: who it is addressed to, and enough `Content-Type` detail to
//! hand the body to the multipart walker. `mailparse` does the header
//! splitting and decodes RFC 2047 encoded-words in the values.

use mailparse::MailHeaderMap;

use crate::error::{Error, Result};
use crate::message::Email;
use crate::mime::verify_header_block;

/// The decoded top-level headers of one candidate message, plus the
/// offset where its body starts.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub date: String,
    pub content_type: String,
    body_offset: usize,
}

impl Envelope {
    /// Parse the header block at the start of a raw RFC 2822 message.
    ///
    /// `From`, `To` and `Subject` come back with encoded-words decoded;
    /// missing headers come back as empty strings. The body is not
    /// touched here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the header block is malformed. A
    /// malformed envelope is fatal for the whole request; it is never
    /// skipped.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let (headers, body_offset) = mailparse::parse_headers(raw)
            .map_err(|e| Error::Parse(format!("envelope: {e}")))?;
        verify_header_block(&raw[..body_offset.min(raw.len())])?;

        let value = |name: &str| headers.get_first_value(name).unwrap_or_default();

        Ok(Self {
            from: value("From"),
            to: value("To"),
            subject: value("Subject"),
            date: value("Date"),
            content_type: value("Content-Type"),
            body_offset,
        })
    }

    /// Whether the decoded `To` header contains the recipient substring.
    #[must_use]
    pub fn is_addressed_to(&self, recipient: &str) -> bool {
        self.to.contains(recipient)
    }

    /// The body bytes of the message this envelope was parsed from.
    #[must_use]
    pub fn body<'a>(&self, raw: &'a [u8]) -> &'a [u8] {
        &raw[self.body_offset.min(raw.len())..]
    }

    /// Seed an [`Email`] record from the envelope fields. Bodies and
    /// attachments are filled in later by the MIME walk.
    #[must_use]
    pub fn into_email(self) -> Email {
        Email {
            from: self.from,
            to: self.to,
            subject: self.subject,
            date: self.date,
            content_type: self.content_type,
            ..Email::default()
        }
    }
}
