//! Store error types.

use std::path::PathBuf;

use goslim_core::{ErrorKind, StageError};

/// Errors from rotating or publishing a file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The previous version could not be copied into its backup slot.
    #[error("cannot back up {} to {}: {source}", published.display(), backup.display())]
    Rotate {
        published: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The staged file could not replace the published one.
    #[error("cannot publish {} to {}: {source}", staging.display(), published.display())]
    Publish {
        staging: PathBuf,
        published: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Nothing was staged for this artifact.
    #[error("staged file {} is missing", .0.display())]
    MissingStaging(PathBuf),

    /// The blocking copy task did not complete.
    #[error("store task failed: {0}")]
    Task(String),
}

impl StoreError {
    /// Every store failure is a filesystem failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Filesystem
    }
}

impl From<&StoreError> for StageError {
    fn from(err: &StoreError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}
