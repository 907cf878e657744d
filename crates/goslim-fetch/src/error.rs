//! Fetch error types.

use std::path::PathBuf;

use goslim_core::{ErrorKind, StageError};
use thiserror::Error;

/// Errors that can occur while fetching an upstream file.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    /// HTTP transport error (connect, timeout, body read).
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream returned a non-success status code.
    #[error("{url} returned HTTP {status}: {message}")]
    Status {
        url: String,
        /// HTTP status code returned by upstream.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// Upstream returned 429 Too Many Requests.
    #[error("{url} rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        url: String,
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// The staging directory could not be created.
    #[error("cannot create staging directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the downloaded body failed.
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Upstream answered with success but the file holds no bytes.
    #[error("{url} returned an empty file at {}", path.display())]
    Empty { url: String, path: PathBuf },

    /// The downloaded gzip stream could not be decompressed.
    #[error("cannot decompress {}: {source}", path.display())]
    Decompress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Position of this error in the run error taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CreateDir { .. } | Self::Write { .. } => ErrorKind::Filesystem,
            Self::Empty { .. } => ErrorKind::Validation,
            Self::Client(_)
            | Self::Http { .. }
            | Self::Status { .. }
            | Self::RateLimited { .. }
            | Self::Decompress { .. } => ErrorKind::Fetch,
        }
    }

    /// The transport status, when upstream answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Whether another attempt may succeed.
    ///
    /// Transport failures, 5xx, and 429 are retried; other 4xx, empty
    /// bodies and local filesystem errors are not.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } | Self::RateLimited { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Client(_)
            | Self::CreateDir { .. }
            | Self::Write { .. }
            | Self::Empty { .. }
            | Self::Decompress { .. } => false,
        }
    }
}

impl From<&FetchError> for StageError {
    fn from(err: &FetchError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}
