//! GO slim aspects and their subset definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Built-in cellular component slim terms.
pub const COMPONENT_TERMS: &[&str] = &[
    "GO:0005576", // extracellular region
    "GO:0005618", // cell wall
    "GO:0005886", // plasma membrane
    "GO:0005634", // nucleus
    "GO:0005730", // nucleolus
    "GO:0005635", // nuclear envelope
    "GO:0005694", // chromosome
    "GO:0005739", // mitochondrion
    "GO:0005783", // endoplasmic reticulum
    "GO:0005794", // Golgi apparatus
    "GO:0005768", // endosome
    "GO:0005773", // vacuole
    "GO:0005777", // peroxisome
    "GO:0005829", // cytosol
    "GO:0005840", // ribosome
    "GO:0005856", // cytoskeleton
    "GO:0031410", // cytoplasmic vesicle
];

/// Built-in biological process slim terms.
pub const PROCESS_TERMS: &[&str] = &[
    "GO:0005975", // carbohydrate metabolic process
    "GO:0006260", // DNA replication
    "GO:0006281", // DNA repair
    "GO:0006351", // DNA-templated transcription
    "GO:0006397", // mRNA processing
    "GO:0006412", // translation
    "GO:0006457", // protein folding
    "GO:0006468", // protein phosphorylation
    "GO:0006629", // lipid metabolic process
    "GO:0006914", // autophagy
    "GO:0006950", // response to stress
    "GO:0007049", // cell cycle
    "GO:0007165", // signal transduction
    "GO:0016192", // vesicle-mediated transport
    "GO:0042254", // ribosome biogenesis
    "GO:0051301", // cell division
    "GO:0055085", // transmembrane transport
];

/// Built-in molecular function slim terms.
pub const FUNCTION_TERMS: &[&str] = &[
    "GO:0003677", // DNA binding
    "GO:0003700", // DNA-binding transcription factor activity
    "GO:0003723", // RNA binding
    "GO:0003735", // structural constituent of ribosome
    "GO:0005198", // structural molecule activity
    "GO:0005215", // transporter activity
    "GO:0008233", // peptidase activity
    "GO:0008289", // lipid binding
    "GO:0016301", // kinase activity
    "GO:0016491", // oxidoreductase activity
    "GO:0016740", // transferase activity
    "GO:0016787", // hydrolase activity
    "GO:0016874", // ligase activity
    "GO:0030234", // enzyme regulator activity
    "GO:0140110", // transcription regulator activity
];

/// One ontology aspect a slim subset is mapped onto.
///
/// Variants are declared in name order, so sorting by the derived `Ord`
/// sorts by category name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlimAspect {
    Component,
    Function,
    Process,
}

impl SlimAspect {
    /// All aspects, sorted by name.
    pub const ALL: [Self; 3] = [Self::Component, Self::Function, Self::Process];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Function => "function",
            Self::Process => "process",
        }
    }

    /// The GAF aspect column code (column 9).
    #[must_use]
    pub const fn gaf_code(self) -> &'static str {
        match self {
            Self::Component => "C",
            Self::Function => "F",
            Self::Process => "P",
        }
    }

    #[must_use]
    pub const fn builtin_terms(self) -> &'static [&'static str] {
        match self {
            Self::Component => COMPONENT_TERMS,
            Self::Function => FUNCTION_TERMS,
            Self::Process => PROCESS_TERMS,
        }
    }
}

impl fmt::Display for SlimAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The term list a slim subset is mapped onto. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlimSubsetDefinition {
    aspect: SlimAspect,
    terms: Vec<String>,
}

impl SlimSubsetDefinition {
    /// Use `terms` when given, otherwise the built-in list for `aspect`.
    #[must_use]
    pub fn new(aspect: SlimAspect, terms: Option<&[String]>) -> Self {
        let terms = match terms {
            Some(terms) if !terms.is_empty() => terms.to_vec(),
            _ => aspect
                .builtin_terms()
                .iter()
                .map(ToString::to_string)
                .collect(),
        };
        Self { aspect, terms }
    }

    #[must_use]
    pub const fn aspect(&self) -> SlimAspect {
        self.aspect
    }

    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// The term list file content handed to the mapper: one id per line.
    #[must_use]
    pub fn to_term_list(&self) -> String {
        let mut out = self.terms.join("\n");
        out.push('\n');
        out
    }
}
