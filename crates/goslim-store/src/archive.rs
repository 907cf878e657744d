//! Backup rotation.
//!
//! The published file is copied, never moved, into its backup slot, so the
//! published path keeps serving until the new version replaces it.

use std::path::Path;

use serde::Serialize;

use crate::atomic::{copy_atomically, existing_len};
use crate::error::StoreError;

/// What rotation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rotation", rename_all = "snake_case")]
pub enum Rotation {
    /// The previous version was copied into the backup slot.
    Rotated { bytes: u64 },
    /// Nothing was published yet (first run).
    NoPrevious,
}

impl Rotation {
    #[must_use]
    pub const fn backed_up(self) -> bool {
        matches!(self, Self::Rotated { .. })
    }
}

/// Copy `published` to `backup`, replacing any older backup.
///
/// Re-running with an unchanged published file leaves the backup holding
/// the same bytes.
///
/// # Errors
///
/// Returns [`StoreError::Rotate`] when the published file cannot be read or
/// the backup cannot be written.
pub fn rotate(published: &Path, backup: &Path) -> Result<Rotation, StoreError> {
    let err = |source| StoreError::Rotate {
        published: published.to_path_buf(),
        backup: backup.to_path_buf(),
        source,
    };
    if existing_len(published).map_err(err)?.is_none() {
        tracing::debug!(path = %published.display(), "no previous version to back up");
        return Ok(Rotation::NoPrevious);
    }
    let bytes = copy_atomically(published, backup).map_err(err)?;
    tracing::debug!(from = %published.display(), to = %backup.display(), bytes, "rotated backup");
    Ok(Rotation::Rotated { bytes })
}
