//! Configuration struct definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The merged quiver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where packages are installed.
    #[serde(default)]
    pub packages: PackagesConfig,
    /// Test runner settings.
    pub runner: RunnerConfig,
    /// Remote package download settings.
    pub fetch: FetchConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// `[packages]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackagesConfig {
    /// Install root override. `None` means `<home>/packages`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_root: Option<PathBuf>,
}

/// `[runner]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Timeout applied when neither the test nor the endpoint sets one.
    pub default_timeout_ms: u64,
    /// `User-Agent` sent with test requests.
    pub user_agent: String,
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Whole-request timeout for package downloads.
    pub timeout_secs: u64,
    /// Largest archive accepted from a URL.
    pub max_download_bytes: u64,
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` level or directive string.
    pub level: String,
    /// One of `pretty`, `compact`, `json`, `full`.
    pub format: String,
    /// Extra `EnvFilter` directives applied after `level`.
    #[serde(default)]
    pub directives: Vec<String>,
}
