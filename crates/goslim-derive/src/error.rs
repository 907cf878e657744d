use std::path::PathBuf;

use goslim_core::{ErrorKind, SlimAspect, StageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} has no annotation records", path.display())]
    EmptyInput { path: PathBuf },
    #[error("filtered output empty: every record of {} was excluded from the {output}", input.display())]
    FilteredEmpty { input: PathBuf, output: &'static str },
    #[error("failed to start mapper '{program}' for {aspect}: {source}")]
    Spawn {
        aspect: SlimAspect,
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("mapper for {aspect} timed out after {secs}s")]
    Timeout { aspect: SlimAspect, secs: u64 },
    #[error("mapper for {aspect} exited with {status}")]
    ToolFailed { aspect: SlimAspect, status: String },
    #[error("mapper for {aspect} produced no annotation records")]
    EmptyOutput { aspect: SlimAspect },
    #[error("mapper task for {aspect} ended unexpectedly: {message}")]
    Task { aspect: SlimAspect, message: String },
}

impl DeriveError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Filesystem,
            Self::EmptyInput { .. } | Self::FilteredEmpty { .. } | Self::EmptyOutput { .. } => {
                ErrorKind::Validation
            }
            Self::Spawn { .. } | Self::Timeout { .. } | Self::ToolFailed { .. } | Self::Task { .. } => {
                ErrorKind::ExternalTool
            }
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<&DeriveError> for StageError {
    fn from(err: &DeriveError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}
