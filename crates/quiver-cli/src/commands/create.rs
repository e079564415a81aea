//! `quiver create`: package a tool folder.

use std::path::Path;

use quiver_packages::PackageCreator;
use serde_json::json;

use super::{CommandContext, CommandStatus, print_validation};
use crate::output::print_json;
use crate::theme::Theme;

pub(crate) fn run_create(
    ctx: &CommandContext,
    folder: &Path,
    output: Option<&Path>,
    validate: bool,
) -> anyhow::Result<CommandStatus> {
    let outcome = PackageCreator::default().create_package(folder, output, validate);

    if ctx.format.is_json() {
        print_json(&json!({
            "validation": outcome.validation,
            "archivePath": outcome.archive_path,
        }))?;
        return Ok(CommandStatus::from_success(outcome.archive_path.is_some()));
    }

    print_validation(&outcome.validation);
    match &outcome.archive_path {
        Some(path) => {
            println!(
                "{}",
                Theme::success(&format!("Created package {}", path.display()))
            );
            if !validate {
                println!("{}", Theme::dimmed("Validation skipped"));
            }
            Ok(CommandStatus::Success)
        },
        None => {
            println!(
                "{}",
                Theme::error(&format!("Failed to create package from {}", folder.display()))
            );
            Ok(CommandStatus::Failure)
        },
    }
}
