//! Multipart MIME tree traversal
//!
//! A multipart body is a flat byte stream in which sibling parts are
//! separated by `--boundary` delimiter lines and closed by a terminal
//! `--boundary--` line; anything before the first delimiter (preamble)
//! and after the terminal one (epilogue) is ignored. Each part is a
//! small header block plus a payload, and a part may itself be another
//! multipart with its own boundary, so traversal is recursive.
//!
//! The walk accumulates into a single mutable [`Email`] record passed
//! down through the recursion: leaf parts go through
//! [`decode_part`](crate::decode::decode_part), nested multiparts
//! recurse with their own boundary.

use mailparse::{MailHeaderMap, ParsedContentType};
use memchr::memmem;

use crate::decode::decode_part;
use crate::error::{Error, Result};
use crate::message::Email;

/// Default cap on multipart nesting. Real mail rarely nests more than
/// three or four levels; the cap exists to bound stack usage on
/// hostile input and can be raised through configuration.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// One MIME part: its parsed header block and raw (still
/// transfer-encoded) payload.
pub struct Part<'a> {
    headers: Vec<mailparse::MailHeader<'a>>,
    body: &'a [u8],
}

impl<'a> Part<'a> {
    /// Split a raw part into headers and payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the part's header block is
    /// malformed; a part that cannot be read aborts the whole parse.
    pub fn parse(raw: &'a [u8]) -> Result<Self> {
        let (headers, body_offset) =
            mailparse::parse_headers(raw).map_err(|e| Error::Parse(format!("mime part: {e}")))?;
        let body_offset = body_offset.min(raw.len());
        verify_header_block(&raw[..body_offset])?;
        Ok(Self {
            headers,
            body: &raw[body_offset..],
        })
    }

    /// The parsed `Content-Type`, or `None` when the part declares
    /// none. Callers must not assume an implicit `text/plain` default:
    /// a part without a declared type takes the attachment path.
    #[must_use]
    pub fn content_type(&self) -> Option<ParsedContentType> {
        self.headers
            .get_first_value("Content-Type")
            .map(|value| mailparse::parse_content_type(&value))
    }

    /// The `Content-Transfer-Encoding` token, trimmed, or `None`.
    #[must_use]
    pub fn transfer_encoding(&self) -> Option<String> {
        self.headers
            .get_first_value("Content-Transfer-Encoding")
            .map(|value| value.trim().to_string())
    }

    /// The `Content-Disposition` filename parameter, or an empty
    /// string when the sender did not set one.
    #[must_use]
    pub fn filename(&self) -> String {
        self.headers
            .get_first_value("Content-Disposition")
            .and_then(|value| {
                mailparse::parse_content_disposition(&value)
                    .params
                    .get("filename")
                    .cloned()
            })
            .unwrap_or_default()
    }

    /// The raw, still transfer-encoded payload.
    #[must_use]
    pub const fn body(&self) -> &'a [u8] {
        self.body
    }
}

/// Check a raw header block line by line, up to the blank separator:
/// every line must be a `name: value` field or a whitespace-led
/// continuation. `parse_headers` recovers from garbage lines by
/// treating them as valueless keys; here they abort the parse instead.
///
/// # Errors
///
/// Returns [`Error::Parse`] naming the first offending line.
pub fn verify_header_block(raw: &[u8]) -> Result<()> {
    for line in raw.split(|&byte| byte == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            break;
        }
        if matches!(line.first(), Some(b' ' | b'\t')) {
            continue;
        }
        if !line.contains(&b':') {
            return Err(Error::Parse(format!(
                "malformed header line: {}",
                String::from_utf8_lossy(line)
            )));
        }
    }
    Ok(())
}

/// Walk a multipart body, decoding every leaf part into `email`.
///
/// Parts whose media type starts with `multipart/` are recursed into
/// using their own `boundary` parameter and the same accumulator; all
/// other parts are handed to the decoder. A body containing no
/// delimiter lines at all yields zero parts and is not an error.
///
/// # Errors
///
/// Returns [`Error::Parse`] when the boundary is empty, a nested
/// multipart lacks a boundary parameter, a part's header block is
/// malformed, the nesting exceeds `max_depth`, or a leaf payload fails
/// to decode. Any such error aborts the whole walk; no partial result
/// is kept.
pub fn walk_multipart(
    body: &[u8],
    boundary: &str,
    email: &mut Email,
    max_depth: usize,
) -> Result<()> {
    if boundary.is_empty() {
        return Err(Error::Parse("empty multipart boundary".to_string()));
    }
    if max_depth == 0 {
        return Err(Error::Parse(
            "multipart nesting exceeds depth limit".to_string(),
        ));
    }

    for raw_part in scan_parts(body, boundary) {
        let part = Part::parse(raw_part)?;
        match part.content_type() {
            Some(ct) if ct.mimetype.starts_with("multipart/") => {
                let nested = ct.params.get("boundary").ok_or_else(|| {
                    Error::Parse(format!("nested {} part has no boundary", ct.mimetype))
                })?;
                walk_multipart(part.body(), nested, email, max_depth - 1)?;
            }
            _ => decode_part(&part, email)?,
        }
    }

    Ok(())
}

/// How a boundary line closes: opening another sibling part, or
/// ending the whole multipart.
#[derive(Clone, Copy)]
enum Boundary {
    Delimiter,
    Terminal,
}

/// Slice a multipart body into its raw sibling parts.
///
/// Delimiter lines are located by scanning for `\n--boundary` (or the
/// same token opening the body); a candidate counts only when the rest
/// of its line is transport padding, so a longer boundary sharing the
/// token as a prefix stays in part content. The CR/LF immediately
/// preceding a delimiter belongs to the delimiter, not to the part
/// payload. A terminal `--boundary--` ends the scan; a final part that
/// is never closed extends to the end of the body.
fn scan_parts<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let needle = format!("\n--{boundary}").into_bytes();
    let token_len = needle.len() - 1;

    let mut parts = Vec::new();
    let mut at = find_boundary(body, &needle, 0);
    while let Some((delimiter, kind)) = at {
        if matches!(kind, Boundary::Terminal) {
            break;
        }
        let after = delimiter + token_len;
        // Part content starts on the line after the delimiter line.
        let Some(line_break) = memchr::memchr(b'\n', &body[after..]) else {
            break;
        };
        let content_start = after + line_break + 1;

        match find_boundary(body, &needle, content_start - 1) {
            Some((next_delimiter, next_kind)) => {
                // The newline (and optional CR) before the delimiter
                // belong to the delimiter line, not to the content.
                let mut content_end = (next_delimiter - 1).max(content_start);
                if content_end > content_start && body[content_end - 1] == b'\r' {
                    content_end -= 1;
                }
                parts.push(&body[content_start..content_end]);
                at = Some((next_delimiter, next_kind));
            }
            None => {
                parts.push(&body[content_start..]);
                at = None;
            }
        }
    }

    parts
}

/// Find the next boundary token at or after `from`, skipping
/// lookalikes whose line continues with anything other than padding.
/// Returns the token's byte offset and how the line closes.
fn find_boundary(body: &[u8], needle: &[u8], from: usize) -> Option<(usize, Boundary)> {
    let token_len = needle.len() - 1;
    if from == 0
        && body.starts_with(&needle[1..])
        && let Some(kind) = boundary_kind(&body[token_len..])
    {
        return Some((0, kind));
    }
    let mut search = from;
    while let Some(found) = memmem::find(&body[search..], needle) {
        let token = search + found + 1;
        if let Some(kind) = boundary_kind(&body[token + token_len..]) {
            return Some((token, kind));
        }
        search = token;
    }
    None
}

/// Classify the text between a boundary token and its end of line:
/// whitespace alone is a delimiter and `--` plus whitespace is the
/// terminal form; anything else is not a boundary line at all.
fn boundary_kind(rest: &[u8]) -> Option<Boundary> {
    let line_end = memchr::memchr(b'\n', rest).unwrap_or(rest.len());
    let line = &rest[..line_end];
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let is_padding = |bytes: &[u8]| bytes.iter().all(|&byte| byte == b' ' || byte == b'\t');
    if let Some(tail) = line.strip_prefix(b"--") {
        return is_padding(tail).then_some(Boundary::Terminal);
    }
    is_padding(line).then_some(Boundary::Delimiter)
}
