//! Leaf part decoding
//!
//! Routes a single MIME part into the right slot of an [`Email`]
//! record. Transfer encoding is checked before media type: a part
//! declaring `base64` or `quoted-printable` becomes an attachment even
//! when its media type is `text/plain`, so an encoded text part never
//! lands in the inline body. Only the exact types `text/plain` and
//! `text/html` are inlined; everything else, including parts with no
//! `Content-Type` header at all, is carried as an attachment.
//!
//! Attachment content is always canonical standard-alphabet base64:
//! encoded payloads are decoded first and re-encoded, so the output
//! never depends on how the sender wrapped their lines.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::{Error, Result};
use crate::message::Email;
use crate::mime::Part;

/// Decode one leaf part into the accumulator.
///
/// # Errors
///
/// Returns [`Error::Parse`] when a declared `base64` or
/// `quoted-printable` payload does not decode. Malformed payloads are
/// fatal for the whole message; there is no skip-and-continue.
pub fn decode_part(part: &Part<'_>, email: &mut Email) -> Result<()> {
    let encoding = part.transfer_encoding().unwrap_or_default();
    let media_type = part
        .content_type()
        .map(|ct| ct.mimetype)
        .unwrap_or_default();
    let payload = part.body();

    if encoding.eq_ignore_ascii_case("base64") {
        let bytes = decode_base64(payload)?;
        email.push_attachment(part.filename(), BASE64.encode(bytes));
    } else if encoding.eq_ignore_ascii_case("quoted-printable") {
        let bytes = decode_quoted_printable(payload)?;
        email.push_attachment(part.filename(), BASE64.encode(bytes));
    } else if media_type == "text/plain" {
        email.set_text_body(String::from_utf8_lossy(payload).into_owned());
    } else if media_type == "text/html" {
        email.set_html_body(String::from_utf8_lossy(payload).into_owned());
    } else {
        email.push_attachment(part.filename(), BASE64.encode(payload));
    }

    Ok(())
}

/// Strict base64 decode of a possibly line-wrapped payload.
///
/// MIME wraps base64 bodies at 76 columns, so CR and LF are stripped
/// before decoding; any other stray byte is an error.
fn decode_base64(payload: &[u8]) -> Result<Vec<u8>> {
    let unwrapped: Vec<u8> = payload
        .iter()
        .copied()
        .filter(|&b| b != b'\r' && b != b'\n')
        .collect();
    BASE64
        .decode(unwrapped)
        .map_err(|e| Error::Parse(format!("base64 payload: {e}")))
}

fn decode_quoted_printable(payload: &[u8]) -> Result<Vec<u8>> {
    quoted_printable::decode(payload, quoted_printable::ParseMode::Strict)
        .map_err(|e| Error::Parse(format!("quoted-printable payload: {e}")))
}
