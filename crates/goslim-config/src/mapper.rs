//! External slim-mapping tool invocation.

use serde::{Deserialize, Serialize};

/// Placeholders the argument template must contain.
pub const REQUIRED_PLACEHOLDERS: [&str; 3] = ["{slim}", "{ontology}", "{annotations}"];

fn default_program() -> String {
    String::from("python3")
}

fn default_args() -> Vec<String> {
    [
        "/var/www/data/map2slim.py",
        "--aspect={aspect}",
        "{slim}",
        "{ontology}",
        "{annotations}",
    ]
        .into_iter()
        .map(String::from)
        .collect()
}

const fn default_timeout_secs() -> u64 {
    1800
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MapperConfig {
    /// Executable to run.
    #[serde(default = "default_program")]
    pub program: String,

    /// Argument template. `{slim}`, `{ontology}` and `{annotations}` are
    /// replaced by paths, `{aspect}` by the GAF aspect code (C, F, P).
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Per-invocation timeout. The child is killed when it expires.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl MapperConfig {
    pub fn is_configured(&self) -> bool {
        !self.program.is_empty() && self.missing_placeholders().is_empty()
    }

    /// Required placeholders that appear in no argument.
    pub fn missing_placeholders(&self) -> Vec<&'static str> {
        REQUIRED_PLACEHOLDERS
            .into_iter()
            .filter(|p| !self.args.iter().any(|arg| arg.contains(p)))
            .collect()
    }
}
