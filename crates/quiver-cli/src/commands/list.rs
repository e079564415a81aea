//! `quiver list`: show installed packages.

use super::{CommandContext, CommandStatus};
use crate::output::print_json;
use crate::theme::Theme;

pub(crate) fn run_list(ctx: &CommandContext) -> anyhow::Result<CommandStatus> {
    let installer = ctx.installer()?;
    let packages = installer.list_installed();

    if ctx.format.is_json() {
        print_json(&packages)?;
        return Ok(CommandStatus::Success);
    }

    if packages.is_empty() {
        println!("{}", Theme::info("No packages installed"));
        return Ok(CommandStatus::Success);
    }

    println!("{}", Theme::header("Installed Packages"));
    println!("  {:<32} {:<14} INSTALLED", "TOOL ID", "VERSION");
    println!("{}", Theme::separator());
    for p in &packages {
        println!(
            "  {:<32} {:<14} {}",
            p.tool_id,
            p.version,
            Theme::timestamp(&p.installed_at)
        );
    }
    println!(
        "\n{}",
        Theme::dimmed(&format!(
            "{} package(s) in {}",
            packages.len(),
            installer.root().display()
        ))
    );

    Ok(CommandStatus::Success)
}
