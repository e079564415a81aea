//! `quiver export`: write installed tools as a definition list.

use std::path::Path;

use anyhow::Context;
use quiver_packages::ToolsExporter;

use super::{CommandContext, CommandStatus};
use crate::output::print_json;
use crate::theme::Theme;

/// Without `output`, the list goes to stdout as JSON in either format.
pub(crate) async fn run_export(
    ctx: &CommandContext,
    output: Option<&Path>,
    run_tests: bool,
) -> anyhow::Result<CommandStatus> {
    let exporter = ToolsExporter::new(ctx.installer()?, ctx.runner()?);
    let tools = exporter
        .export_tools(output, run_tests)
        .await
        .context("failed to export tools")?;

    let Some(path) = output else {
        print_json(&tools)?;
        return Ok(CommandStatus::Success);
    };

    if ctx.format.is_json() {
        print_json(&tools)?;
        return Ok(CommandStatus::Success);
    }

    println!(
        "{}",
        Theme::success(&format!("Exported {} tool(s) to {}", tools.len(), path.display()))
    );
    for tool in &tools {
        let tests = tool.test_summary.as_ref().map_or_else(String::new, |s| {
            format!(" ({}/{} tests passed)", s.passed, s.total)
        });
        println!("  {}{}", tool.tool_id, Theme::dimmed(&tests));
    }
    Ok(CommandStatus::Success)
}
