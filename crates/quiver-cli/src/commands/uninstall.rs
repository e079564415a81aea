//! `quiver uninstall`: remove an installed tool.

use serde_json::json;

use super::{CommandContext, CommandStatus};
use crate::output::print_json;
use crate::theme::Theme;

pub(crate) fn run_uninstall(ctx: &CommandContext, tool_id: &str) -> anyhow::Result<CommandStatus> {
    let removed = ctx.installer()?.uninstall(tool_id);

    if ctx.format.is_json() {
        print_json(&json!({ "toolId": tool_id, "removed": removed }))?;
    } else if removed {
        println!("{}", Theme::success(&format!("Uninstalled {tool_id}")));
    } else {
        println!("{}", Theme::error(&format!("Tool '{tool_id}' is not installed")));
    }
    Ok(CommandStatus::from_success(removed))
}
