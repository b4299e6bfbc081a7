use log::debug;
use thiserror::Error;

use crate::commands::script::{Registry, ScriptDefinition};

/// Errors that can occur while expanding a script into shell commands
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BuildError {
    /// `chain` is the expansion path, ending with the name that was re-entered
    #[error("Circular reference detected: {}", .chain.join(" -> "))]
    CircularReference { name: String, chain: Vec<String> },
}

/// Resolve the script called `name` into the shell commands it runs.
///
/// # Errors
///
/// Returns `BuildError::CircularReference` if the script refers back to itself.
pub fn build_script(
    name: &str,
    args: &[String],
    registry: &Registry,
) -> Result<Vec<String>, BuildError> {
    build_commands(&ScriptDefinition::Leaf(name.to_string()), args, registry)
}

/// Expand a definition into a flat list of shell commands.
///
/// A leaf whose text is exactly a registered script name is replaced by that
/// script's own definition. Every other leaf is a shell command and gets `args`
/// appended, space separated.
///
/// # Errors
///
/// Returns `BuildError::CircularReference` when a name is re-entered while it is
/// still being expanded.
pub fn build_commands(
    value: &ScriptDefinition,
    args: &[String],
    registry: &Registry,
) -> Result<Vec<String>, BuildError> {
    let mut path = Vec::new();
    let mut commands = Vec::new();
    expand(value, args, registry, &mut path, &mut commands)?;
    debug!("Resolved {} command(s): {commands:?}", commands.len());
    Ok(commands)
}

fn expand<'r>(
    value: &'r ScriptDefinition,
    args: &[String],
    registry: &'r Registry,
    path: &mut Vec<&'r str>,
    commands: &mut Vec<String>,
) -> Result<(), BuildError> {
    match value {
        ScriptDefinition::Leaf(text) => match registry.get_key_value(text) {
            Some((name, definition)) => {
                if path.contains(&name) {
                    let mut chain: Vec<String> = path.iter().map(|n| (*n).to_string()).collect();
                    chain.push(name.to_string());
                    return Err(BuildError::CircularReference {
                        name: name.to_string(),
                        chain,
                    });
                }
                path.push(name);
                expand(definition, args, registry, path, commands)?;
                path.pop();
            }
            None => commands.push(append_args(text, args)),
        },
        ScriptDefinition::Sequence(steps) => {
            for step in steps {
                expand(step, args, registry, path, commands)?;
            }
        }
        ScriptDefinition::Described { command, .. } => {
            expand(command, args, registry, path, commands)?;
        }
    }
    Ok(())
}

fn append_args(command: &str, args: &[String]) -> String {
    if args.is_empty() {
        command.to_string()
    } else {
        format!("{command} {}", args.join(" "))
    }
}
