//! `quiver install`: install from a local archive or a URL.

use std::path::Path;

use quiver_packages::InstallOutcome;
use serde_json::json;

use super::{CommandContext, CommandStatus, print_validation};
use crate::output::print_json;
use crate::theme::Theme;

/// Whether `source` should be fetched rather than read from disk.
fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

pub(crate) async fn run_install(
    ctx: &CommandContext,
    source: &str,
    validate: bool,
) -> anyhow::Result<CommandStatus> {
    let installer = ctx.installer()?;

    let outcome: InstallOutcome = if is_remote(source) {
        if !ctx.format.is_json() {
            println!("{}", Theme::info(&format!("Downloading {source}")));
        }
        installer.install_from_url(source, validate).await
    } else {
        installer.install_from_path(Path::new(source), validate)
    };

    if ctx.format.is_json() {
        print_json(&json!({
            "validation": outcome.validation,
            "package": outcome.package,
        }))?;
        return Ok(CommandStatus::from_success(outcome.package.is_some()));
    }

    print_validation(&outcome.validation);
    let Some(package) = &outcome.package else {
        println!("{}", Theme::error(&format!("Failed to install {source}")));
        return Ok(CommandStatus::Failure);
    };

    println!(
        "{}",
        Theme::success(&format!(
            "Installed {} v{}",
            package.tool_id, package.version
        ))
    );
    println!("{}", Theme::kv("Location", &package.install_path.display().to_string()));
    Ok(CommandStatus::Success)
}
