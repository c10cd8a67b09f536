use crate::config::types::{Config, CrawlerConfig, InputConfig, OutputConfig, ProxyConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on a single chunk's concurrency
const MAX_CHUNK_SIZE: usize = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_proxy_config(&config.proxy)?;
    validate_input_config(&config.input)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.chunk_size < 1 || config.chunk_size > MAX_CHUNK_SIZE {
        return Err(ConfigError::Validation(format!(
            "chunk_size must be between 1 and {}, got {}",
            MAX_CHUNK_SIZE, config.chunk_size
        )));
    }

    if config.request_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates the proxy endpoint
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    let Some(raw) = &config.url else {
        return Ok(());
    };

    // Never echo the raw value: it usually carries credentials
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "proxy url must use http or https scheme, got '{}'",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl("proxy url has no host".to_string()));
    }

    Ok(())
}

fn validate_input_config(config: &InputConfig) -> Result<(), ConfigError> {
    if config.urls_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "urls_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation("output path cannot be empty".to_string()));
    }
    Ok(())
}
