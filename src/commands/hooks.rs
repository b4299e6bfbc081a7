//! Discovery of the `pre`/`post` scripts that wrap a target script

use std::fmt;

use log::debug;
use thiserror::Error;

use crate::commands::script::{Registry, ScriptDefinition};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HookError {
    #[error(
        "Mixed hook styles for '{target}': found {} and {}. Use either 'pre-{target}'/'post-{target}' or 'pre{target}'/'post{target}', not both",
        .dashed.join(", "),
        .concatenated.join(", ")
    )]
    MixedStyles {
        target: String,
        dashed: Vec<String>,
        concatenated: Vec<String>,
    },
}

/// Naming convention used for hook scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStyle {
    /// `pre-test` / `post-test`
    Dashed,
    /// `pretest` / `posttest`
    Concatenated,
}

impl HookStyle {
    /// Names of the (pre, post) hooks for `target` in this style
    #[must_use]
    pub fn names(self, target: &str) -> (String, String) {
        match self {
            HookStyle::Dashed => (format!("pre-{target}"), format!("post-{target}")),
            HookStyle::Concatenated => (format!("pre{target}"), format!("post{target}")),
        }
    }
}

impl fmt::Display for HookStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookStyle::Dashed => write!(f, "dashed"),
            HookStyle::Concatenated => write!(f, "concatenated"),
        }
    }
}

/// Hook commands to run around one target script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookPair {
    pub pre: Vec<String>,
    pub post: Vec<String>,
}

impl HookPair {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pre.is_empty() && self.post.is_empty()
    }
}

/// Registered hook names for `target` in one style
fn present_hooks<'r>(target: &str, style: HookStyle, registry: &'r Registry) -> Vec<&'r str> {
    let (pre, post) = style.names(target);
    [pre, post]
        .iter()
        .filter_map(|name| registry.get_key_value(name).map(|(key, _)| key))
        .collect()
}

/// Find the pre and post hooks registered for `target`.
///
/// Hook commands are taken literally: they are not expanded as references and
/// trailing arguments are not appended to them.
///
/// # Errors
///
/// Returns `HookError::MixedStyles` if both dashed and concatenated hooks exist for `target`.
pub fn discover_hooks(target: &str, registry: &Registry) -> Result<HookPair, HookError> {
    let dashed = present_hooks(target, HookStyle::Dashed, registry);
    let concatenated = present_hooks(target, HookStyle::Concatenated, registry);

    let style = match (dashed.is_empty(), concatenated.is_empty()) {
        (true, true) => return Ok(HookPair::default()),
        (false, true) => HookStyle::Dashed,
        (true, false) => HookStyle::Concatenated,
        (false, false) => {
            return Err(HookError::MixedStyles {
                target: target.to_string(),
                dashed: dashed.into_iter().map(str::to_string).collect(),
                concatenated: concatenated.into_iter().map(str::to_string).collect(),
            });
        }
    };

    let (pre_name, post_name) = style.names(target);
    let hooks = HookPair {
        pre: registry.get(&pre_name).map(hook_commands).unwrap_or_default(),
        post: registry.get(&post_name).map(hook_commands).unwrap_or_default(),
    };
    debug!("Found {style} hooks for '{target}': {hooks:?}");
    Ok(hooks)
}

/// Flatten a hook definition into literal commands
#[must_use]
pub fn hook_commands(definition: &ScriptDefinition) -> Vec<String> {
    match definition {
        ScriptDefinition::Leaf(command) => vec![command.clone()],
        ScriptDefinition::Sequence(steps) => steps.iter().flat_map(hook_commands).collect(),
        ScriptDefinition::Described { command, .. } => hook_commands(command),
    }
}

/// Whether `name` is a hook of some other registered script
#[must_use]
pub fn is_hook_name(name: &str, registry: &Registry) -> bool {
    ["pre-", "post-", "pre", "post"].iter().any(|prefix| {
        name.strip_prefix(prefix)
            .is_some_and(|target| !target.is_empty() && registry.contains(target))
    })
}
