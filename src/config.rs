//! Service configuration

use crate::error::{Error, Result};
use crate::mime::DEFAULT_MAX_DEPTH;
use crate::poll::PollConfig;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the receive-email service
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub mail_dir: PathBuf,
    pub secret_name: String,
    pub poll_deadline: Duration,
    pub poll_interval: Duration,
    pub max_mime_depth: usize,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `LETTERBOX_MAIL_DIR` (maildrop directory to poll)
    /// - `LETTERBOX_SECRET_NAME` (name of the API secret)
    ///
    /// Optional (with defaults):
    /// - `LETTERBOX_HOST` (default: `127.0.0.1`)
    /// - `LETTERBOX_PORT` (default: `8080`)
    /// - `LETTERBOX_POLL_DEADLINE_SECS` (default: `25`)
    /// - `LETTERBOX_POLL_INTERVAL_MS` (default: `1000`)
    /// - `LETTERBOX_MAX_MIME_DEPTH` (default: `32`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a required variable is missing
    /// or a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            host: env::var("LETTERBOX_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("LETTERBOX_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|e| Error::Config(format!("Invalid LETTERBOX_PORT: {e}")))?,
            mail_dir: env::var("LETTERBOX_MAIL_DIR")
                .map(PathBuf::from)
                .map_err(|_| Error::Config("LETTERBOX_MAIL_DIR not set".into()))?,
            secret_name: env::var("LETTERBOX_SECRET_NAME")
                .map_err(|_| Error::Config("LETTERBOX_SECRET_NAME not set".into()))?,
            poll_deadline: Duration::from_secs(parse_var("LETTERBOX_POLL_DEADLINE_SECS", 25)?),
            poll_interval: Duration::from_millis(parse_var("LETTERBOX_POLL_INTERVAL_MS", 1000)?),
            max_mime_depth: parse_var("LETTERBOX_MAX_MIME_DEPTH", DEFAULT_MAX_DEPTH)?,
        })
    }

    /// Polling parameters carried by this configuration.
    #[must_use]
    pub const fn poll(&self) -> PollConfig {
        PollConfig {
            deadline: self.poll_deadline,
            interval: self.poll_interval,
            max_depth: self.max_mime_depth,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}
