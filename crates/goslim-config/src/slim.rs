//! Optional overrides of the built-in GO slim term lists.

use serde::{Deserialize, Serialize};

use goslim_core::{SlimAspect, SlimSubsetDefinition};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SlimConfig {
    #[serde(default)]
    pub component: Option<Vec<String>>,
    #[serde(default)]
    pub process: Option<Vec<String>>,
    #[serde(default)]
    pub function: Option<Vec<String>>,
}

impl SlimConfig {
    /// Subset definition for `aspect`, falling back to the built-in terms.
    pub fn definition(&self, aspect: SlimAspect) -> SlimSubsetDefinition {
        let terms = match aspect {
            SlimAspect::Component => self.component.as_deref(),
            SlimAspect::Process => self.process.as_deref(),
            SlimAspect::Function => self.function.as_deref(),
        };
        SlimSubsetDefinition::new(aspect, terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_aspects_use_builtin_terms() {
        let config = SlimConfig {
            process: Some(vec!["GO:0008150".into()]),
            ..Default::default()
        };
        assert_eq!(
            config.definition(SlimAspect::Process).terms(),
            &["GO:0008150".to_string()]
        );
        assert_eq!(
            config.definition(SlimAspect::Component).terms().len(),
            SlimAspect::Component.builtin_terms().len()
        );
    }
}
