//! Where every file of one run lives.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use goslim_config::{GoslimConfig, PathsConfig};
use goslim_core::{AnnotationFile, ArtifactPaths, OntologyFile, SlimAnnotationFile, SlimAspect};

/// File entities of one run, resolved against its own staging directory.
#[derive(Debug, Clone)]
pub struct RunLayout {
    /// `<staging_dir>/run-<UTC timestamp>`, private to this run.
    pub staging_dir: PathBuf,
    pub published_dir: PathBuf,
    pub ontology: OntologyFile,
    pub annotation: AnnotationFile,
    /// One per aspect, in name order.
    pub slims: Vec<SlimAnnotationFile>,
}

impl RunLayout {
    #[must_use]
    pub fn new(config: &GoslimConfig, started_at: DateTime<Utc>) -> Self {
        let paths = &config.paths;
        let staging_dir = paths
            .staging_dir
            .join(format!("run-{}", started_at.format("%Y%m%dT%H%M%SZ")));
        let published_dir = paths.published_dir.clone();
        let artifact =
            |name: &str| ArtifactPaths::for_file(name, &staging_dir, &published_dir, &paths.backup_suffix);

        let ontology = OntologyFile {
            source_url: config.sources.ontology_url.clone(),
            paths: artifact(&paths.ontology_file),
        };
        let annotation = AnnotationFile {
            source_url: config.sources.annotation_url.clone(),
            paths: artifact(&paths.annotation_file),
            fetched: staging_dir.join(format!("{}.fetched", paths.annotation_file)),
            mapper_input: staging_dir.join(format!("{}.mapper", paths.annotation_file)),
        };

        let slims = SlimAspect::ALL
            .into_iter()
            .map(|aspect| SlimAnnotationFile {
                definition: config.slim.definition(aspect),
                term_list: staging_dir.join(PathsConfig::term_list_file(aspect)),
                paths: artifact(&paths.slim_file(aspect)),
            })
            .collect();

        Self {
            staging_dir,
            published_dir,
            ontology,
            annotation,
            slims,
        }
    }
}
