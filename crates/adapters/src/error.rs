//! Adapter-level error type.
//!
//! Executors convert these into the `Error:` protocol strings; the variants
//! exist so the conversion can distinguish timeouts and status classes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Non-success response from a remote API.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("smtp error: {0}")]
    Smtp(String),

    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl AdapterError {
    /// True when the underlying reqwest error was a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}
