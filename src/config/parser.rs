use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable that overrides `[proxy] url`
pub const PROXY_ENV_VAR: &str = "HARVEST_PROXY_URL";

/// Loads and parses a configuration file from the given path
///
/// The proxy URL from [`PROXY_ENV_VAR`] takes precedence over the file, so
/// credentials can stay out of checked-in configuration.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let mut config: Config = toml::from_str(&content)?;
    apply_env_overrides(&mut config);

    validate(&config)?;

    Ok(config)
}

/// Applies environment overrides to a configuration
pub fn apply_env_overrides(config: &mut Config) {
    if let Ok(proxy) = std::env::var(PROXY_ENV_VAR) {
        let proxy = proxy.trim();
        if !proxy.is_empty() {
            config.proxy.url = Some(proxy.to_string());
        }
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so output files can be traced back to the
/// configuration that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
