use goslim_config::GoslimConfig;

/// Config sections that can be set through `GOSLIM_<SECTION>__<FIELD>`.
const SECTIONS: &[&str] = &["SOURCES", "PATHS", "FETCH", "FILTER", "MAPPER", "SLIM", "NOTIFY"];

/// Emit warnings for likely mistyped env var keys and for report delivery
/// that will not happen.
pub fn warn_unconfigured(config: &GoslimConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &GoslimConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = Vec::new();

    for section in SECTIONS {
        let single = format!("GOSLIM_{section}_");
        let double = format!("GOSLIM_{section}__");
        if let Some(key) = env_keys
            .iter()
            .find(|key| key.starts_with(&single) && !key.starts_with(&double))
        {
            let field = &key[single.len()..];
            warnings.push(format!(
                "{key} is ignored. Use double underscores (example: {double}{field})."
            ));
        }
    }

    if !config.notify.is_configured() {
        if has_env_prefix(&env_keys, "GOSLIM_NOTIFY__") {
            warnings.push(
                "Notify config is incomplete while GOSLIM_NOTIFY__* env vars exist. Set sender, recipient and command."
                    .to_string(),
            );
        } else {
            warnings.push(
                "Report delivery is not configured; the transcript will be written to stderr instead."
                    .to_string(),
            );
        }
    }

    warnings
}

fn has_env_prefix(keys: &[String], prefix: &str) -> bool {
    keys.iter().any(|key| key.starts_with(prefix))
}
