//! `quiver info`: show an installed tool's record and manifest summary.

use serde_json::json;

use super::{CommandContext, CommandStatus};
use crate::output::print_json;
use crate::theme::Theme;

pub(crate) fn run_info(ctx: &CommandContext, tool_id: &str) -> anyhow::Result<CommandStatus> {
    let installer = ctx.installer()?;
    let (Some(info), Some(manifest)) =
        (installer.package_info(tool_id), installer.load_manifest(tool_id))
    else {
        if ctx.format.is_json() {
            print_json(&json!({ "error": format!("tool '{tool_id}' is not installed") }))?;
        } else {
            println!("{}", Theme::error(&format!("Tool '{tool_id}' is not installed")));
        }
        return Ok(CommandStatus::Failure);
    };

    if ctx.format.is_json() {
        print_json(&json!({ "package": info, "manifest": manifest }))?;
        return Ok(CommandStatus::Success);
    }

    println!("{}", Theme::header(&format!("Tool: {}", info.tool_id)));
    println!("{}", Theme::kv("Name", &info.name));
    println!("{}", Theme::kv("Version", &info.version));
    println!("{}", Theme::kv("Description", &info.description));
    if !info.capabilities.is_empty() {
        println!("{}", Theme::kv("Capabilities", &info.capabilities.join(", ")));
    }
    if let Some(endpoint) = &manifest.endpoint {
        println!(
            "{}",
            Theme::kv("Endpoint", &format!("{} {}", endpoint.method, endpoint.url))
        );
    }
    if let Some(auth) = &manifest.auth {
        let env = auth.env_names();
        let auth_line = if env.is_empty() {
            auth.kind.clone()
        } else {
            format!("{} (env: {})", auth.kind, env.join(", "))
        };
        println!("{}", Theme::kv("Auth", &auth_line));
    }
    println!(
        "{}",
        Theme::kv("Tests", &manifest.test_paths().len().to_string())
    );
    println!("{}", Theme::kv("Location", &info.install_path.display().to_string()));
    println!("{}", Theme::kv("Installed", &Theme::timestamp(&info.installed_at)));
    if let Some(source) = &info.source {
        println!("{}", Theme::kv("Source", &source.to_string()));
    }
    if let Some(digest) = &info.archive_digest {
        println!("{}", Theme::kv("Digest", &Theme::dimmed(digest)));
    }
    Ok(CommandStatus::Success)
}
