//! Atomic publication of staged artifacts.

use std::path::Path;

use goslim_core::ArtifactPaths;
use serde::Serialize;

use crate::archive::{Rotation, rotate};
use crate::atomic::{copy_atomically, existing_len};
use crate::error::StoreError;

/// Outcome of rotating and replacing one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    /// File name under the published directory.
    pub artifact: String,
    #[serde(flatten)]
    pub rotation: Rotation,
    /// Bytes now served at the published path.
    pub bytes: u64,
}

/// Replace `published` with the content of `staging` in one rename.
///
/// # Errors
///
/// Returns [`StoreError::MissingStaging`] when nothing was staged, and
/// [`StoreError::Publish`] when the copy or rename fails. On error the
/// published file is untouched.
pub fn publish(staging: &Path, published: &Path) -> Result<u64, StoreError> {
    let err = |source| StoreError::Publish {
        staging: staging.to_path_buf(),
        published: published.to_path_buf(),
        source,
    };
    if existing_len(staging).map_err(err)?.is_none() {
        return Err(StoreError::MissingStaging(staging.to_path_buf()));
    }
    let bytes = copy_atomically(staging, published).map_err(err)?;
    tracing::info!(path = %published.display(), bytes, "published");
    Ok(bytes)
}

/// Rotate the backup, then publish the staged file.
///
/// A failed rotation stops before the published file is touched.
///
/// # Errors
///
/// See [`rotate`] and [`publish`].
pub fn replace_blocking(paths: &ArtifactPaths) -> Result<Replacement, StoreError> {
    if existing_len(&paths.staging).ok().flatten().is_none() {
        return Err(StoreError::MissingStaging(paths.staging.clone()));
    }
    let rotation = rotate(&paths.published, &paths.backup)?;
    let bytes = publish(&paths.staging, &paths.published)?;
    Ok(Replacement {
        artifact: artifact_name(&paths.published),
        rotation,
        bytes,
    })
}

/// [`replace_blocking`] on the blocking pool.
///
/// # Errors
///
/// See [`replace_blocking`].
pub async fn replace(paths: &ArtifactPaths) -> Result<Replacement, StoreError> {
    let paths = paths.clone();
    tokio::task::spawn_blocking(move || replace_blocking(&paths))
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
}

/// File name of a published path, for reporting.
#[must_use]
pub fn artifact_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
