//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Validate a fully-merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    if config.runner.default_timeout_ms == 0 {
        return Err(invalid("runner.default_timeout_ms", "must be positive"));
    }
    if config.runner.user_agent.trim().is_empty() {
        return Err(invalid("runner.user_agent", "must not be empty"));
    }
    if config.fetch.timeout_secs == 0 {
        return Err(invalid("fetch.timeout_secs", "must be positive"));
    }
    if config.fetch.max_download_bytes == 0 {
        return Err(invalid("fetch.max_download_bytes", "must be positive"));
    }
    if !LOG_FORMATS.contains(&config.logging.format.to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "logging.format",
            &format!(
                "unknown format '{}'; expected one of: {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }
    if let Some(root) = &config.packages.install_root
        && root.as_os_str().is_empty()
    {
        return Err(invalid("packages.install_root", "must not be empty"));
    }
    Ok(())
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.to_owned(),
    }
}
