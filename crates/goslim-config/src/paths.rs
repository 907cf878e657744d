//! Filesystem layout: published directory, staging root, file names.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use goslim_core::SlimAspect;

fn default_published_dir() -> PathBuf {
    PathBuf::from("/var/www/data")
}

fn default_staging_dir() -> PathBuf {
    std::env::temp_dir().join("goslim")
}

fn default_annotation_file() -> String {
    String::from("gene_association.sgd")
}

fn default_ontology_file() -> String {
    String::from("gene_ontology.obo")
}

fn default_backup_suffix() -> String {
    String::from(".bak")
}

const fn default_lock_wait_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Directory the web application serves files from.
    #[serde(default = "default_published_dir")]
    pub published_dir: PathBuf,

    /// Root under which each run creates its own staging directory.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// File name of the published annotation set.
    #[serde(default = "default_annotation_file")]
    pub annotation_file: String,

    /// File name of the published ontology.
    #[serde(default = "default_ontology_file")]
    pub ontology_file: String,

    /// Appended to a published file name to form its backup slot.
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,

    /// Keep the run's staging directory after a fully successful run.
    #[serde(default)]
    pub keep_staging: bool,

    /// How long to wait for another run's lock before giving up.
    #[serde(default = "default_lock_wait_secs")]
    pub lock_wait_secs: u64,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            published_dir: default_published_dir(),
            staging_dir: default_staging_dir(),
            annotation_file: default_annotation_file(),
            ontology_file: default_ontology_file(),
            backup_suffix: default_backup_suffix(),
            keep_staging: false,
            lock_wait_secs: default_lock_wait_secs(),
        }
    }
}

impl PathsConfig {
    /// Published file name of the slim subset for `aspect`.
    #[must_use]
    pub fn slim_file(&self, aspect: SlimAspect) -> String {
        format!("slim_{aspect}_{}", self.annotation_file)
    }

    /// Term list file name written to staging for `aspect`.
    #[must_use]
    pub fn term_list_file(aspect: SlimAspect) -> String {
        format!("goslim_{aspect}.txt")
    }
}
