//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed env var manipulation.

use std::path::{Path, PathBuf};

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use goslim_config::GoslimConfig;
use goslim_core::SlimAspect;
use pretty_assertions::assert_eq;

#[test]
fn loads_paths_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[paths]
published_dir = "/srv/go/data"
staging_dir = "/srv/go/staging"
annotation_file = "gene_association.fb"
backup_suffix = ".prev"
keep_staging = true
lock_wait_secs = 5
"#,
        )?;

        let config: GoslimConfig = Figment::from(Serialized::defaults(GoslimConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.paths.published_dir, PathBuf::from("/srv/go/data"));
        assert_eq!(config.paths.staging_dir, PathBuf::from("/srv/go/staging"));
        assert_eq!(config.paths.annotation_file, "gene_association.fb");
        assert_eq!(config.paths.ontology_file, "gene_ontology.obo");
        assert_eq!(config.paths.backup_suffix, ".prev");
        assert!(config.paths.keep_staging);
        assert_eq!(config.paths.lock_wait_secs, 5);
        assert_eq!(
            config.paths.slim_file(SlimAspect::Component),
            "slim_component_gene_association.fb"
        );
        Ok(())
    });
}

#[test]
fn loads_filter_and_mapper_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[filter]
excluded_id_prefixes = ["CPX-", "URS"]
excluded_evidence_codes = ["IEA"]

[mapper]
program = "/usr/local/bin/map2slim"
args = ["--aspect", "{aspect}", "{slim}", "{ontology}", "{annotations}"]
timeout_secs = 60
"#,
        )?;

        let config: GoslimConfig = Figment::from(Serialized::defaults(GoslimConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.filter.excluded_id_prefixes, vec!["CPX-", "URS"]);
        assert_eq!(config.filter.excluded_evidence_codes, vec!["IEA"]);
        assert_eq!(config.filter.evidence_field, 6);
        assert_eq!(config.mapper.program, "/usr/local/bin/map2slim");
        assert_eq!(config.mapper.args.len(), 5);
        assert_eq!(config.mapper.timeout_secs, 60);
        assert!(config.mapper.is_configured());
        Ok(())
    });
}

#[test]
fn loads_slim_overrides_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[slim]
process = ["GO:0008150", "GO:0006412"]
"#,
        )?;

        let config: GoslimConfig = Figment::from(Serialized::defaults(GoslimConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        let process = config.slim.definition(SlimAspect::Process);
        assert_eq!(process.terms(), &["GO:0008150".to_string(), "GO:0006412".to_string()]);
        assert!(config.slim.component.is_none());
        Ok(())
    });
}

#[test]
fn local_goslim_toml_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "goslim.toml",
            r#"
[sources]
ontology_url = "https://mirror.example.org/go.obo"
"#,
        )?;

        let config = GoslimConfig::load(None).expect("config loads");
        assert_eq!(config.sources.ontology_url, "https://mirror.example.org/go.obo");
        Ok(())
    });
}

#[test]
fn explicit_file_beats_local_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "goslim.toml",
            r#"
[fetch]
max_attempts = 2
"#,
        )?;
        jail.create_file(
            "explicit.toml",
            r#"
[fetch]
max_attempts = 7
"#,
        )?;

        let config = GoslimConfig::load(Some(Path::new("explicit.toml"))).expect("config loads");
        assert_eq!(config.fetch.max_attempts, 7);
        Ok(())
    });
}

#[test]
fn invalid_mapper_template_fails_validation() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "goslim.toml",
            r#"
[mapper]
args = ["{slim}", "{ontology}"]
"#,
        )?;

        let err = GoslimConfig::load(None).unwrap_err();
        assert!(err.to_string().contains("{annotations}"));
        Ok(())
    });
}
