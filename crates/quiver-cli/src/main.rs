//! Quiver CLI - tool package manager
//!
//! Creates, validates, installs, tests and exports self-describing tool
//! packages. Every command exits `0` on success, `1` when validation or a
//! test fails, and `2` on an unexpected error.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use quiver_config::ResolvedConfig;
use quiver_config::loader::LOG_ENV_VAR;
use quiver_telemetry::{LogConfig, LogFormat};

mod commands;
mod config_bridge;
mod output;
mod theme;

use commands::{CommandContext, CommandStatus};
use output::OutputFormat;
use theme::Theme;

/// Quiver - tool package manager
#[derive(Parser)]
#[command(name = "quiver")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output (QUIVER_LOG still decides the level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: pretty (default) or json
    #[arg(long, global = true, default_value = "pretty")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Package a tool folder into a .tpkg archive
    Create {
        /// Folder containing manifest.json
        folder: PathBuf,

        /// Archive path (defaults to <toolId>-<version>.tpkg beside the folder)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip manifest and test validation
        #[arg(long)]
        no_validate: bool,
    },

    /// Install a package from a local archive or an http(s) URL
    Install {
        /// Archive path or URL
        source: String,

        /// Skip manifest validation
        #[arg(long)]
        no_validate: bool,
    },

    /// List installed packages
    List,

    /// Run the test suite of an installed tool
    Test {
        /// Tool ID (e.g. demo.echo)
        tool_id: String,
    },

    /// Export installed tools as a flat definition list
    Export {
        /// Write the list to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Run each tool's tests and attach a summary
        #[arg(long)]
        run_tests: bool,
    },

    /// Validate a manifest file
    Validate {
        /// Path to manifest.json
        manifest: PathBuf,
    },

    /// Remove an installed tool
    Uninstall {
        /// Tool ID
        tool_id: String,
    },

    /// Show details of an installed tool
    Info {
        /// Tool ID
        tool_id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let workspace_root = std::env::current_dir().ok();
    let resolved = quiver_config::QuiverHome::resolve()
        .map_err(anyhow::Error::from)
        .and_then(|home| {
            quiver_config::Config::load(workspace_root.as_deref(), &home).map_err(Into::into)
        });

    let mut logging = log_config(resolved.as_ref().ok(), cli.verbose);
    if !std::io::stderr().is_terminal() {
        logging = logging.without_ansi();
    }
    if let Err(e) = quiver_telemetry::setup_logging(&logging) {
        eprintln!("Failed to initialize logging: {e}");
    }
    tracing::debug!(level = %logging.level, format = %logging.format, "logging initialized");

    // The loader ran before a subscriber existed; replay what it applied.
    match &resolved {
        Ok(r) => {
            for path in &r.loaded_files {
                tracing::info!(path = %path.display(), "loaded config layer");
            }
            for var in &r.env_overrides {
                tracing::info!(var, "applied environment override");
            }
            if cli.verbose && r.env_overrides.contains(&LOG_ENV_VAR) {
                tracing::debug!("{LOG_ENV_VAR} sets the log level; --verbose only adds file info");
            }
            tracing::debug!(install_root = %r.install_root().display(), "configuration loaded");
        },
        Err(e) => tracing::warn!(error = %e, "configuration unavailable"),
    }

    let ctx = CommandContext {
        config: resolved,
        format: OutputFormat::parse(&cli.format),
    };

    match run(cli.command, &ctx).await {
        Ok(CommandStatus::Success) => ExitCode::SUCCESS,
        Ok(CommandStatus::Failure) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{}", Theme::error(&format!("{e:#}")));
            ExitCode::from(2)
        },
    }
}

/// Logging settings from the loaded config.
///
/// `--verbose` adds file and line info and raises the level to `debug`,
/// unless `QUIVER_LOG` chose the level.
fn log_config(resolved: Option<&ResolvedConfig>, verbose: bool) -> LogConfig {
    let mut lc = resolved
        .and_then(|r| config_bridge::to_log_config(&r.config).ok())
        .unwrap_or_else(|| LogConfig::new("warn").with_format(LogFormat::Compact));
    if verbose {
        let level_from_env = resolved.is_some_and(|r| r.env_overrides.contains(&LOG_ENV_VAR));
        if !level_from_env {
            "debug".clone_into(&mut lc.level);
        }
        lc = lc.with_file_info();
    }
    lc
}

async fn run(command: Commands, ctx: &CommandContext) -> anyhow::Result<CommandStatus> {
    match command {
        Commands::Create {
            folder,
            output,
            no_validate,
        } => commands::create::run_create(ctx, &folder, output.as_deref(), !no_validate),
        Commands::Install {
            source,
            no_validate,
        } => commands::install::run_install(ctx, &source, !no_validate).await,
        Commands::List => commands::list::run_list(ctx),
        Commands::Test { tool_id } => commands::test::run_test(ctx, &tool_id).await,
        Commands::Export { output, run_tests } => {
            commands::export::run_export(ctx, output.as_deref(), run_tests).await
        },
        Commands::Validate { manifest } => commands::validate::run_validate(ctx, &manifest),
        Commands::Uninstall { tool_id } => commands::uninstall::run_uninstall(ctx, &tool_id),
        Commands::Info { tool_id } => commands::info::run_info(ctx, &tool_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create_flags() {
        let cli = Cli::try_parse_from([
            "quiver",
            "create",
            "tools/echo",
            "-o",
            "out.tpkg",
            "--no-validate",
        ])
        .unwrap();
        match cli.command {
            Commands::Create {
                folder,
                output,
                no_validate,
            } => {
                assert_eq!(folder, PathBuf::from("tools/echo"));
                assert_eq!(output, Some(PathBuf::from("out.tpkg")));
                assert!(no_validate);
            },
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli =
            Cli::try_parse_from(["quiver", "export", "--run-tests", "--format", "json", "-v"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, "json");
        assert!(matches!(
            cli.command,
            Commands::Export {
                output: None,
                run_tests: true
            }
        ));
    }

    fn resolved(env: &[(&str, &str)]) -> (tempfile::TempDir, ResolvedConfig) {
        let tmp = tempfile::tempdir().unwrap();
        let home = quiver_config::QuiverHome::from_path(tmp.path());
        let env: std::collections::HashMap<String, String> = env
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let resolved = quiver_config::loader::load(None, &home, &env).unwrap();
        (tmp, resolved)
    }

    #[test]
    fn verbose_raises_level_and_adds_file_info() {
        let (_tmp, r) = resolved(&[]);

        let quiet = log_config(Some(&r), false);
        assert_eq!(quiet.level, "warn");
        assert!(!quiet.file_info);
        assert_eq!(quiet.directives, r.config.logging.directives);

        let verbose = log_config(Some(&r), true);
        assert_eq!(verbose.level, "debug");
        assert!(verbose.file_info);
    }

    #[test]
    fn env_level_wins_over_verbose() {
        let (_tmp, r) = resolved(&[(LOG_ENV_VAR, "quiver_packages=trace")]);

        let lc = log_config(Some(&r), true);
        assert_eq!(lc.level, "quiver_packages=trace");
        assert!(lc.file_info);
    }

    #[test]
    fn missing_config_falls_back_to_warn() {
        assert_eq!(log_config(None, false).level, "warn");
        assert_eq!(log_config(None, true).level, "debug");
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["quiver"]).is_err());
        assert!(Cli::try_parse_from(["quiver", "test"]).is_err());
    }
}
