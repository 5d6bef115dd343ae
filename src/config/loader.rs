//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Port the relay listens on.
pub const ENV_PORT: &str = "PORT";
/// Registration key shared with the portal.
pub const ENV_REG_KEY: &str = "REG_KEY";
/// Override for the portal endpoint.
pub const ENV_UPSTREAM_URL: &str = "UPSTREAM_URL";
/// Fallback log level when `RUST_LOG` is unset.
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    Env { key: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file into a configuration without validating it.
pub fn read_config_file(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment overrides on top of `config`.
///
/// `lookup` abstracts the environment so callers can feed a fixed map.
/// Empty values count as unset.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(port) = get(ENV_PORT) {
        config.listener.port = port.trim().parse::<u16>().map_err(|e: std::num::ParseIntError| {
            ConfigError::Env {
                key: ENV_PORT,
                reason: e.to_string(),
            }
        })?;
    }

    if let Some(reg_key) = get(ENV_REG_KEY) {
        config.upstream.reg_key = reg_key;
    }

    if let Some(url) = get(ENV_UPSTREAM_URL) {
        config.upstream.url = url;
    }

    if let Some(level) = get(ENV_LOG_LEVEL) {
        config.observability.log_level = level;
    }

    Ok(())
}

/// Load, override and validate configuration.
///
/// Starts from defaults (or `path` when given), then applies process
/// environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => RelayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
