//! Conversions from the loaded config into engine and logging settings.

use std::collections::HashMap;
use std::time::Duration;

use quiver_config::{Config, ResolvedConfig};
use quiver_packages::{FetchSettings, PackageInstaller, TestRunner};
use quiver_telemetry::{LogConfig, LogFormat, TelemetryResult};

/// Convert the `[logging]` section to a [`LogConfig`].
///
/// # Errors
///
/// Returns an error if the format is not a known [`LogFormat`].
pub(crate) fn to_log_config(cfg: &Config) -> TelemetryResult<LogConfig> {
    let format: LogFormat = cfg.logging.format.parse()?;

    let mut log_config = LogConfig::new(&cfg.logging.level).with_format(format);
    for directive in &cfg.logging.directives {
        log_config = log_config.with_directive(directive);
    }

    Ok(log_config)
}

/// Convert the `[fetch]` section to installer download limits.
pub(crate) fn to_fetch_settings(cfg: &Config) -> FetchSettings {
    FetchSettings {
        timeout: Duration::from_secs(cfg.fetch.timeout_secs),
        max_bytes: cfg.fetch.max_download_bytes,
        ..FetchSettings::default()
    }
}

/// An installer over the effective install root.
pub(crate) fn to_installer(resolved: &ResolvedConfig) -> PackageInstaller {
    PackageInstaller::new(resolved.install_root())
        .with_fetch_settings(to_fetch_settings(&resolved.config))
}

/// A test runner using the `[runner]` section and the given credential
/// environment.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub(crate) fn to_runner(
    cfg: &Config,
    env: HashMap<String, String>,
) -> anyhow::Result<TestRunner> {
    let client = reqwest::Client::builder()
        .user_agent(&cfg.runner.user_agent)
        .build()?;
    Ok(TestRunner::new(client, env)
        .with_default_timeout(Duration::from_millis(cfg.runner.default_timeout_ms)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(format: &str) -> Config {
        toml::from_str(&format!(
            r#"
            [runner]
            default_timeout_ms = 5000
            user_agent = "test-agent"

            [fetch]
            timeout_secs = 7
            max_download_bytes = 2048

            [logging]
            level = "info"
            format = "{format}"
            directives = ["reqwest=warn"]
            "#
        ))
        .unwrap()
    }

    #[test]
    fn log_format_mapping() {
        let log = |format: &str| to_log_config(&config(format)).unwrap();
        assert_eq!(log("json").format, LogFormat::Json);
        assert_eq!(log("pretty").format, LogFormat::Pretty);
        assert_eq!(log("full").format, LogFormat::Full);
        assert_eq!(log("compact").format, LogFormat::Compact);
        assert_eq!(log("json").level, "info");
        assert_eq!(log("json").directives, vec!["reqwest=warn"]);
    }

    #[test]
    fn unknown_log_format_is_an_error() {
        let err = to_log_config(&config("xml")).unwrap_err();
        assert!(err.to_string().contains("xml"), "{err}");
    }

    #[test]
    fn fetch_settings_come_from_config() {
        let fetch = to_fetch_settings(&config("compact"));
        assert_eq!(fetch.timeout, Duration::from_secs(7));
        assert_eq!(fetch.max_bytes, 2048);
        assert!(fetch.user_agent.starts_with("quiver/"));
    }

    #[test]
    fn installer_uses_configured_root() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = config("compact");
        cfg.packages.install_root = Some(tmp.path().join("custom"));
        let resolved = ResolvedConfig {
            config: cfg,
            home: quiver_config::QuiverHome::from_path(tmp.path()),
            loaded_files: Vec::new(),
            env_overrides: Vec::new(),
        };
        assert_eq!(to_installer(&resolved).root(), tmp.path().join("custom"));
    }
}
