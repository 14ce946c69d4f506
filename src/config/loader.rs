//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::VaultConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Replaces `entitlements.allowed_ips`.
pub const ALLOWED_IPS_ENV: &str = "ALLOWED_IPS";
/// Replaces the listener with `0.0.0.0:<PORT>`.
pub const PORT_ENV: &str = "PORT";
/// Path of the TOML file when `--config` is not given.
pub const CONFIG_PATH_ENV: &str = "VAULT_CONFIG";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn read_config(path: &Path) -> Result<VaultConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Load the optional file, apply process environment overrides, validate.
pub fn load(path: Option<&Path>) -> Result<VaultConfig, ConfigError> {
    load_config(path, |name| std::env::var(name).ok())
}

/// Load the optional TOML file, apply overrides from `lookup`, validate.
pub fn load_config<F>(path: Option<&Path>, lookup: F) -> Result<VaultConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = path.map(read_config).transpose()?.unwrap_or_default();

    apply_env_overrides(&mut config, lookup);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `ALLOWED_IPS` and `PORT`. Empty variables count as unset.
pub fn apply_env_overrides<F>(config: &mut VaultConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| lookup(name).filter(|value| !value.is_empty());

    if let Some(allowed_ips) = lookup(ALLOWED_IPS_ENV) {
        config.entitlements.allowed_ips = allowed_ips;
    }

    if let Some(port) = lookup(PORT_ENV) {
        config.listener.bind_address = format!("0.0.0.0:{port}");
    }
}
