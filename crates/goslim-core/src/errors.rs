//! Cross-cutting error types for goslim.
//!
//! Every crate defines its own error enum (`FetchError`, `StoreError`, ...).
//! Each of those maps onto one [`ErrorKind`] so the run log and the exit code
//! speak a single taxonomy. A [`StageError`] is the flattened form stored in
//! the run log and rendered into the report.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stage::Stage;

/// The error taxonomy of a refresh run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network or transport failure while fetching an upstream file.
    Fetch,
    /// Directory or file creation, copy, or move failure.
    Filesystem,
    /// The external mapping tool exited non-zero, timed out, or could not start.
    ExternalTool,
    /// An intermediate output was empty or malformed.
    Validation,
    /// The delivery collaborator rejected or failed to send the report.
    Notification,
    /// The run was interrupted by a signal.
    Cancelled,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch_error",
            Self::Filesystem => "filesystem_error",
            Self::ExternalTool => "external_tool_error",
            Self::Validation => "validation_error",
            Self::Notification => "notification_error",
            Self::Cancelled => "cancelled",
        }
    }

    /// Process exit code for a run aborted with this kind.
    ///
    /// Notification failures never change the exit code, so they map to 0.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Fetch => 10,
            Self::Filesystem => 11,
            Self::ExternalTool => 12,
            Self::Validation => 13,
            Self::Notification => 0,
            Self::Cancelled => 130,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure as recorded in the run log.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct StageError {
    pub kind: ErrorKind,
    pub message: String,
}

impl StageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn filesystem(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Filesystem, message)
    }

    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "run interrupted by signal")
    }
}

/// Errors raised by core types themselves.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A run stage transition was attempted that the state machine forbids.
    #[error("Invalid state transition: run from {from} to {to}")]
    InvalidTransition { from: Stage, to: Stage },
}
