//! CLI command handlers.

pub(crate) mod create;
pub(crate) mod export;
pub(crate) mod info;
pub(crate) mod install;
pub(crate) mod list;
pub(crate) mod uninstall;
pub(crate) mod validate;

use std::collections::HashMap;

use anyhow::Context;
use quiver_config::ResolvedConfig;
use quiver_packages::{PackageInstaller, TestRunner, ValidationResult};

use crate::config_bridge;
use crate::output::OutputFormat;
use crate::theme::Theme;

/// How a command finished when it did not hit an unexpected error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandStatus {
    Success,
    /// Validation failed, a test failed, or the target was not installed.
    Failure,
}

impl CommandStatus {
    pub(crate) fn from_success(ok: bool) -> Self {
        if ok { Self::Success } else { Self::Failure }
    }
}

/// State shared by every command.
pub(crate) struct CommandContext {
    /// Config load result; commands that need it surface the error.
    pub(crate) config: anyhow::Result<ResolvedConfig>,
    pub(crate) format: OutputFormat,
}

impl CommandContext {
    pub(crate) fn resolved(&self) -> anyhow::Result<&ResolvedConfig> {
        self.config
            .as_ref()
            .map_err(|e| anyhow::anyhow!("failed to load configuration: {e:#}"))
    }

    pub(crate) fn installer(&self) -> anyhow::Result<PackageInstaller> {
        Ok(config_bridge::to_installer(self.resolved()?))
    }

    /// A runner that looks credentials up in the process environment.
    pub(crate) fn runner(&self) -> anyhow::Result<TestRunner> {
        let env: HashMap<String, String> = std::env::vars().collect();
        config_bridge::to_runner(&self.resolved()?.config, env)
            .context("failed to build HTTP client")
    }
}

/// Print errors and warnings of a validation result.
pub(crate) fn print_validation(result: &ValidationResult) {
    for error in &result.errors {
        println!("{}", Theme::error(error));
    }
    for warning in &result.warnings {
        println!("{}", Theme::warning(warning));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_success() {
        assert_eq!(CommandStatus::from_success(true), CommandStatus::Success);
        assert_eq!(CommandStatus::from_success(false), CommandStatus::Failure);
    }

    #[test]
    fn config_error_surfaces_on_use() {
        let ctx = CommandContext {
            config: Err(anyhow::anyhow!("bad toml")),
            format: OutputFormat::Pretty,
        };
        let err = ctx.installer().unwrap_err().to_string();
        assert!(err.contains("failed to load configuration"), "{err}");
        assert!(err.contains("bad toml"), "{err}");
    }
}
