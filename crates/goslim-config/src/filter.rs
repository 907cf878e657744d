//! Evidence filter markers.

use serde::{Deserialize, Serialize};

fn default_excluded_id_prefixes() -> Vec<String> {
    vec![String::from("CPX-")]
}

fn default_excluded_evidence_codes() -> Vec<String> {
    vec![String::from("IEA"), String::from("IBA")]
}

/// GAF column 2, DB Object ID.
const fn default_id_field() -> usize {
    1
}

/// GAF column 7, Evidence Code.
const fn default_evidence_field() -> usize {
    6
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Records whose identifier starts with one of these are dropped from
    /// both the published annotation set and the mapper input.
    #[serde(default = "default_excluded_id_prefixes")]
    pub excluded_id_prefixes: Vec<String>,

    /// Records with one of these evidence codes are additionally dropped
    /// from the mapper input.
    #[serde(default = "default_excluded_evidence_codes")]
    pub excluded_evidence_codes: Vec<String>,

    /// Zero-based column holding the identifier.
    #[serde(default = "default_id_field")]
    pub id_field: usize,

    /// Zero-based column holding the evidence code.
    #[serde(default = "default_evidence_field")]
    pub evidence_field: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            excluded_id_prefixes: default_excluded_id_prefixes(),
            excluded_evidence_codes: default_excluded_evidence_codes(),
            id_field: default_id_field(),
            evidence_field: default_evidence_field(),
        }
    }
}
