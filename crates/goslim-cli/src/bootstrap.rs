use std::path::Path;

use anyhow::Context;
use goslim_config::GoslimConfig;

use crate::cli::GlobalFlags;

pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<GoslimConfig> {
    load_dotenv(flags.config.as_deref())?;

    GoslimConfig::load(flags.config.as_deref()).context("failed to load goslim configuration")
}

/// Load `.env` next to an explicit config file, falling back to the
/// current directory.
fn load_dotenv(explicit: Option<&Path>) -> anyhow::Result<()> {
    if let Some(dir) = explicit.and_then(Path::parent) {
        let env_path = dir.join(".env");
        if env_path.is_file() {
            dotenvy::from_path(&env_path)
                .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
            return Ok(());
        }
    }

    dotenvy::dotenv().ok();
    Ok(())
}
