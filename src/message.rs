//! Normalized email records
//!
//! The JSON shape returned to harness callers is fixed: `From`, `To`,
//! `Subject`, `Date`, `ContentType`, `HTMLBody`, `TEXTBody` and
//! `Attachments: [{Filename, ContentBase64}]`. Bodies that were never
//! assigned serialize as empty strings, and a message without
//! attachments serializes with an empty array.

use serde::{Deserialize, Serialize};

/// A single decoded attachment.
///
/// The payload is always carried as canonical standard-alphabet base64,
/// regardless of the transfer encoding the sender used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Filename from the part's `Content-Disposition`; empty when the
    /// sender did not set one.
    #[serde(rename = "Filename")]
    pub filename: String,

    /// Decoded payload, re-encoded as canonical base64.
    #[serde(rename = "ContentBase64")]
    pub content_base64: String,
}

/// The assembled result of parsing one matching email.
///
/// Constructed from the envelope headers once a recipient match is
/// found, then filled in place as the MIME tree is walked. At most one
/// plain-text and one HTML body are retained: when several leaf parts
/// declare the same media type, the last one processed overwrites the
/// earlier ones. That mirrors the behavior harness callers already
/// depend on and is deliberate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    #[serde(rename = "From")]
    pub from: String,

    #[serde(rename = "To")]
    pub to: String,

    #[serde(rename = "Subject")]
    pub subject: String,

    /// Unfolded `Date` header text; well-formed mail never carries
    /// encoded words here.
    #[serde(rename = "Date")]
    pub date: String,

    /// Declared top-level `Content-Type` header value, parameters and all.
    #[serde(rename = "ContentType")]
    pub content_type: String,

    /// HTML body; empty when the message carried none.
    #[serde(rename = "HTMLBody")]
    pub html_body: String,

    /// Plain-text body; empty when the message carried none.
    #[serde(rename = "TEXTBody")]
    pub text_body: String,

    /// Attachments in the order their parts were encountered.
    #[serde(rename = "Attachments")]
    pub attachments: Vec<Attachment>,
}

impl Email {
    /// Assign the plain-text body, overwriting any earlier one.
    pub fn set_text_body(&mut self, body: String) {
        self.text_body = body;
    }

    /// Assign the HTML body, overwriting any earlier one.
    pub fn set_html_body(&mut self, body: String) {
        self.html_body = body;
    }

    /// Append an attachment, preserving encounter order.
    pub fn push_attachment(&mut self, filename: String, content_base64: String) {
        self.attachments.push(Attachment {
            filename,
            content_base64,
        });
    }
}
