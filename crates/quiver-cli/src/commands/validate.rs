//! `quiver validate`: check a manifest file.

use std::path::Path;

use quiver_packages::ManifestValidator;

use super::{CommandContext, CommandStatus, print_validation};
use crate::output::print_json;
use crate::theme::Theme;

pub(crate) fn run_validate(ctx: &CommandContext, manifest: &Path) -> anyhow::Result<CommandStatus> {
    let result = ManifestValidator::default().validate_file(manifest);

    if ctx.format.is_json() {
        print_json(&result)?;
        return Ok(CommandStatus::from_success(result.is_valid));
    }

    print_validation(&result);
    if result.is_valid {
        println!(
            "{}",
            Theme::success(&format!("{} is valid", manifest.display()))
        );
    } else {
        println!(
            "{}",
            Theme::error(&format!(
                "{} has {} error(s)",
                manifest.display(),
                result.errors.len()
            ))
        );
    }
    Ok(CommandStatus::from_success(result.is_valid))
}
