//! Upstream source URLs.

use serde::{Deserialize, Serialize};

fn default_annotation_url() -> String {
    String::from("https://current.geneontology.org/annotations/sgd.gaf.gz")
}

fn default_ontology_url() -> String {
    String::from("https://purl.obolibrary.org/obo/go.obo")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// GAF annotation file. A `.gz` URL is decompressed after download.
    #[serde(default = "default_annotation_url")]
    pub annotation_url: String,

    /// OBO ontology document.
    #[serde(default = "default_ontology_url")]
    pub ontology_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            annotation_url: default_annotation_url(),
            ontology_url: default_ontology_url(),
        }
    }
}

impl SourcesConfig {
    pub fn is_configured(&self) -> bool {
        is_http_url(&self.annotation_url) && is_http_url(&self.ontology_url)
    }
}

pub(crate) fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_configured() {
        let config = SourcesConfig::default();
        assert!(config.is_configured());
        assert!(config.annotation_url.ends_with(".gz"));
    }

    #[test]
    fn non_http_url_is_not_configured() {
        let config = SourcesConfig {
            ontology_url: "ftp://example.org/go.obo".into(),
            ..Default::default()
        };
        assert!(!config.is_configured());
    }
}
