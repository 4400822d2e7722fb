//! Letterbox mail-receive library
//!
//! Waits for the most recent message addressed to a recipient to land
//! in a message drop, then returns it as a structured [`Email`] with
//! inline text and HTML bodies plus base64-encoded attachments.
//! Storage and secret lookup sit behind the [`ObjectStore`] and
//! [`SecretStore`] traits, so deployments pick their own backends; a
//! local maildrop directory and environment-variable secrets are
//! provided out of the box.
//!
//! The `server` feature (on by default) adds an HTTP surface exposing
//! the same operation as `GET /receive_email`.

mod auth;
mod client;
mod config;
mod decode;
mod envelope;
mod error;
mod message;
mod mime;
mod poll;
mod select;
#[cfg(feature = "server")]
pub mod server;
mod store;

pub use client::Letterbox;
pub use config::Config;
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use message::{Attachment, Email};
pub use mime::{DEFAULT_MAX_DEPTH, walk_multipart};
pub use poll::{PollConfig, poll_for_message};
pub use select::find_latest;
pub use store::{EnvSecretStore, FsObjectStore, ObjectMeta, ObjectStore, RawBlob, SecretStore};
