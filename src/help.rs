//! Help text listing the scripts a project defines

use std::fmt::Write;

use crate::commands::hooks::{discover_hooks, hook_commands, is_hook_name};
use crate::commands::script::{Registry, UnknownCommand};
use crate::messages::Style;

/// The "Commands:" section of `uvtask --help`. Hook scripts are left out.
#[must_use]
pub fn render_script_list(registry: &Registry, style: Style) -> String {
    let names: Vec<&str> = registry
        .names()
        .filter(|name| !is_hook_name(name, registry))
        .collect();

    let mut out = style.header("Commands:");
    out.push('\n');
    if names.is_empty() {
        out.push_str("  ");
        out.push_str(&style.dim("No scripts defined in pyproject.toml"));
        out.push('\n');
        return out;
    }

    let width = names.iter().map(|name| name.chars().count()).max().unwrap_or(0);
    for name in names {
        let padding = " ".repeat(width - name.chars().count());
        match registry.description(name) {
            Some(description) => {
                let _ = writeln!(out, "  {}{padding}  {description}", style.accent(name));
            }
            None => {
                let _ = writeln!(out, "  {}", style.accent(name));
            }
        }
    }
    out
}

/// Help for one script: its description, usage and the commands it runs
///
/// # Errors
///
/// Returns `UnknownCommand` if `name` is not a registered script.
pub fn render_script_help(
    name: &str,
    registry: &Registry,
    style: Style,
) -> Result<String, UnknownCommand> {
    registry.validate_exists(name)?;

    let mut out = String::new();
    if let Some(description) = registry.description(name) {
        let _ = writeln!(out, "{description}\n");
    }
    let _ = writeln!(out, "{} uvtask {name} [ARGS]...", style.header("Usage:"));

    if let Some(definition) = registry.get(name) {
        let _ = writeln!(out, "\n{}", style.header("Runs:"));
        for step in hook_commands(definition) {
            let _ = writeln!(out, "  {}", style.accent(&step));
        }
    }

    if let Ok(hooks) = discover_hooks(name, registry)
        && !hooks.is_empty()
    {
        let _ = writeln!(out, "\n{}", style.header("Hooks:"));
        for command in &hooks.pre {
            let _ = writeln!(out, "  {} {command}", style.dim("pre "));
        }
        for command in &hooks.post {
            let _ = writeln!(out, "  {} {command}", style.dim("post"));
        }
    }
    Ok(out)
}
