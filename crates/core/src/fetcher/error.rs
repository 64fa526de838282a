//! Error types for the fetcher module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching a file.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Empty source or destination.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Transport-level failure (DNS, connect, reset, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("Server returned HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// Local write failure.
    #[error("I/O error writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this failure came from the remote side rather than local disk.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Http { .. })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::Http {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            },
            None => Self::Network(e.to_string()),
        }
    }
}
