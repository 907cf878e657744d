//! File entities handled by a refresh run.
//!
//! Every entity carries its full path triple so stages never rely on the
//! process working directory. The published path always holds the most
//! recent successfully processed version; the backup path holds the one
//! before it.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::slim::{SlimAspect, SlimSubsetDefinition};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    /// Where the current run writes the new version.
    pub staging: PathBuf,
    /// Where readers find the current version.
    pub published: PathBuf,
    /// Where the previous published version is kept.
    pub backup: PathBuf,
}

impl ArtifactPaths {
    /// Build the triple for `file_name` from the run's directories.
    #[must_use]
    pub fn for_file(
        file_name: &str,
        staging_dir: &Path,
        published_dir: &Path,
        backup_suffix: &str,
    ) -> Self {
        Self {
            staging: staging_dir.join(file_name),
            published: published_dir.join(file_name),
            backup: published_dir.join(format!("{file_name}{backup_suffix}")),
        }
    }
}

/// The OBO ontology document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OntologyFile {
    pub source_url: String,
    pub paths: ArtifactPaths,
}

/// The GAF annotation file.
///
/// `paths.staging` holds the filtered (published) annotation set; the raw
/// download and the mapper input live next to it in staging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationFile {
    pub source_url: String,
    pub paths: ArtifactPaths,
    /// The file as fetched, before any filtering.
    pub fetched: PathBuf,
    /// The further-filtered file handed to the mapping tool.
    pub mapper_input: PathBuf,
}

/// A slim-mapped annotation subset for one aspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlimAnnotationFile {
    pub definition: SlimSubsetDefinition,
    /// Term list written for the mapper.
    pub term_list: PathBuf,
    pub paths: ArtifactPaths,
}

impl SlimAnnotationFile {
    #[must_use]
    pub const fn aspect(&self) -> SlimAspect {
        self.definition.aspect()
    }
}
