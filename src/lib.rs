//! Core implementation of the uvtask script runner
//!
//! uvtask runs named shell scripts defined in a project's `pyproject.toml`. A
//! script may refer to other scripts by name, and `pre`/`post` hook scripts run
//! around it. This crate loads the scripts, resolves an invocation into a
//! [`Plan`] and runs it with a [`run::Orchestrator`].

use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::commands::builder::{BuildError, build_script};
use crate::commands::hooks::{HookError, HookPair, discover_hooks};
use crate::commands::script::{Registry, UnknownCommand};
use crate::config_file::{ConfigError, PyProject};

pub mod commands;
pub mod config_file;
pub mod executor;
pub mod help;
pub mod logger;
pub mod messages;
pub mod run;
pub mod suggest;

/// Load scripts from a config file (or `pyproject.toml` in the cwd), returning them and the file path.
///
/// # Errors
///
/// Returns `ConfigError` if the config file is not found, cannot be parsed,
/// or contains a script with an invalid shape.
pub fn load_registry(config_file: Option<&Path>) -> Result<(Registry, PathBuf), ConfigError> {
    let config_path = match config_file {
        Some(file) => {
            if !file.exists() {
                return Err(ConfigError::ConfigNotFound(file.to_path_buf()));
            }
            file.to_path_buf()
        }
        None => PyProject::find_config()?,
    };
    debug!("Loading scripts from {}", config_path.display());
    let registry = PyProject::from_file(&config_path)?.into_registry()?;
    Ok((registry, config_path))
}

/// Errors that stop an invocation before anything runs
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlanError {
    #[error(transparent)]
    UnknownCommand(#[from] UnknownCommand),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Hooks(#[from] HookError),
}

/// Everything one invocation will run, resolved up front
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub target: String,
    pub commands: Vec<String>,
    pub hooks: HookPair,
}

impl Plan {
    /// Resolve `target` with its trailing `args`.
    ///
    /// Hooks are looked up unless `skip_hooks` is set. They are checked before the
    /// target is expanded, so a mixed hook setup is reported even if the target
    /// itself would also fail to expand.
    ///
    /// # Errors
    ///
    /// Returns `PlanError` if `target` is not registered, its hooks mix naming
    /// styles, or its expansion is circular.
    pub fn new(
        target: &str,
        args: &[String],
        registry: &Registry,
        skip_hooks: bool,
    ) -> Result<Self, PlanError> {
        registry.validate_exists(target)?;
        let hooks = if skip_hooks {
            debug!("Hooks disabled for '{target}'");
            HookPair::default()
        } else {
            discover_hooks(target, registry)?
        };
        let commands = build_script(target, args, registry)?;
        Ok(Self {
            target: target.to_string(),
            commands,
            hooks,
        })
    }
}
