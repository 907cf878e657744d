use std::path::PathBuf;

use goslim_core::{ErrorKind, StageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification is not configured: {0}")]
    NotConfigured(String),
    #[error("cannot write envelope {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot encode envelope: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to start delivery command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("delivery command timed out after {secs}s")]
    Timeout { secs: u64 },
    #[error("delivery command exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

impl NotifyError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Notification
    }
}

impl From<&NotifyError> for StageError {
    fn from(err: &NotifyError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}
