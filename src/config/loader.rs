//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::EdgeConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::routing::locale::LocaleSetError;
use crate::routing::matcher::PatternError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Locale set: {0}")]
    Locales(#[from] LocaleSetError),

    #[error("Experiment pattern: {0}")]
    Pattern(#[from] PatternError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, override from the process environment, and validate a TOML file.
pub fn load_config(path: &Path) -> Result<EdgeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: EdgeConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build a configuration from defaults plus the process environment.
pub fn load_from_env() -> Result<EdgeConfig, ConfigError> {
    let config = defaults_with_env(|key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Defaults with environment overrides applied, not validated.
pub fn defaults_with_env<F>(lookup: F) -> EdgeConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = EdgeConfig::default();
    apply_env_overrides(&mut config, lookup);
    config
}

/// Apply environment overrides using the given lookup.
///
/// Recognized variables:
/// - `EXPERIMENT_PAGES`: comma separated experiment paths
/// - `EDGE_LOCALES`, `EDGE_DEFAULT_LOCALE`
/// - `EDGE_ORIGIN`
/// - `FLAGS_SDK_KEY`, `FLAGS_WEBHOOK_SECRET`, `FLAGS_DISCOVERY_SECRET`
pub fn apply_env_overrides<F>(config: &mut EdgeConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(pages) = lookup("EXPERIMENT_PAGES") {
        config.experiments.pages = split_list(&pages);
    }
    if let Some(locales) = lookup("EDGE_LOCALES") {
        config.locales.supported = split_list(&locales);
    }
    if let Some(default) = lookup("EDGE_DEFAULT_LOCALE") {
        config.locales.default = default.trim().to_string();
    }
    if let Some(origin) = lookup("EDGE_ORIGIN") {
        config.origin.address = origin.trim().to_string();
    }
    if let Some(key) = lookup("FLAGS_SDK_KEY") {
        config.flags.sdk_key = key;
    }
    if let Some(secret) = lookup("FLAGS_WEBHOOK_SECRET") {
        config.webhook.secret = Some(secret);
    }
    if let Some(secret) = lookup("FLAGS_DISCOVERY_SECRET") {
        config.flags.discovery_secret = Some(secret);
    }
}

/// Split a comma separated list, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
