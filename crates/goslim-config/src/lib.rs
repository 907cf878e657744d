//! # goslim-config
//!
//! Layered configuration loading for goslim using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`GOSLIM_*` prefix, `__` as separator)
//! 2. An explicit file passed with `--config`
//! 3. Project-level `./goslim.toml`
//! 4. User-level `~/.config/goslim/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `GOSLIM_NOTIFY__SENDER` -> `notify.sender`,
//! `GOSLIM_PATHS__PUBLISHED_DIR` -> `paths.published_dir`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use goslim_config::GoslimConfig;
//!
//! let config = GoslimConfig::load_with_dotenv(None).expect("config");
//! if config.notify.is_configured() {
//!     println!("reports go to {}", config.notify.recipient);
//! }
//! ```

mod error;
mod fetch;
mod filter;
mod mapper;
mod notify;
mod paths;
mod slim;
mod sources;

pub use error::ConfigError;
pub use fetch::FetchConfig;
pub use filter::FilterConfig;
pub use mapper::MapperConfig;
pub use notify::NotifyConfig;
pub use paths::PathsConfig;
pub use slim::SlimConfig;
pub use sources::SourcesConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-local config file name.
pub const LOCAL_CONFIG_FILE: &str = "goslim.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GoslimConfig {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub mapper: MapperConfig,
    #[serde(default)]
    pub slim: SlimConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl GoslimConfig {
    /// Load configuration from all sources (TOML files + environment variables)
    /// and validate it.
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the explicit file is missing, extraction
    /// fails, or a value is invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ConfigError::invalid(
                    "--config",
                    format!("{} does not exist", path.display()),
                ));
            }
        }
        let config: Self = Self::figment(explicit).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_dotenv(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load(explicit)
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Explicit --config file
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        // Layer 4: Environment variables (highest priority)
        figment.merge(Env::prefixed("GOSLIM_").split("__"))
    }

    /// Check values no default could make unsafe.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !sources::is_http_url(&self.sources.annotation_url) {
            return Err(ConfigError::invalid(
                "sources.annotation_url",
                "must be an http(s) URL",
            ));
        }
        if !sources::is_http_url(&self.sources.ontology_url) {
            return Err(ConfigError::invalid(
                "sources.ontology_url",
                "must be an http(s) URL",
            ));
        }
        for (field, name) in [
            ("paths.annotation_file", &self.paths.annotation_file),
            ("paths.ontology_file", &self.paths.ontology_file),
        ] {
            if name.is_empty() || name.contains('/') {
                return Err(ConfigError::invalid(field, "must be a plain file name"));
            }
        }
        if self.paths.annotation_file == self.paths.ontology_file {
            return Err(ConfigError::invalid(
                "paths.ontology_file",
                "must differ from paths.annotation_file",
            ));
        }
        if self.paths.backup_suffix.is_empty() {
            return Err(ConfigError::invalid(
                "paths.backup_suffix",
                "must not be empty (backup would overwrite the published file)",
            ));
        }
        if self.fetch.max_attempts == 0 {
            return Err(ConfigError::invalid("fetch.max_attempts", "must be at least 1"));
        }
        for (field, secs) in [
            ("fetch.timeout_secs", self.fetch.timeout_secs),
            ("mapper.timeout_secs", self.mapper.timeout_secs),
            ("notify.timeout_secs", self.notify.timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::invalid(field, "must be greater than zero"));
            }
        }
        if self.mapper.program.is_empty() {
            return Err(ConfigError::NotConfigured {
                section: "mapper".to_string(),
            });
        }
        if let Some(missing) = self.mapper.missing_placeholders().first() {
            return Err(ConfigError::invalid(
                "mapper.args",
                format!("missing placeholder {missing}"),
            ));
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("goslim").join("config.toml"))
    }
}
