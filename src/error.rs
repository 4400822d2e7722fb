//! Error types for letterbox

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Object store error: {0}")]
    Store(String),

    #[error("Secret store error: {0}")]
    Secret(String),

    #[error("Mail parsing error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
