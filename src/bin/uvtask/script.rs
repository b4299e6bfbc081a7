use std::process::ExitCode;

use uvtask::commands::script::Registry;
use uvtask::executor::ShellExecutor;
use uvtask::messages::Style;
use uvtask::run::Orchestrator;
use uvtask::{Plan, PlanError};

pub struct RunOptions {
    pub quiet: u8,
    pub verbose: u8,
    pub no_hooks: bool,
    pub style: Style,
}

/// Run a script with its hooks and trailing arguments.
///
/// # Errors
///
/// Returns an error if the script cannot be resolved into commands or the
/// executor cannot be created.
pub fn run(
    target: &str,
    args: &[String],
    registry: &Registry,
    options: &RunOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let plan = match Plan::new(target, args, registry, options.no_hooks) {
        Ok(plan) => plan,
        Err(PlanError::UnknownCommand(e)) => return Ok(crate::unknown_command(&e, options.style)),
        Err(e) => return Err(e.into()),
    };

    let executor = ShellExecutor::new(options.style)?;
    let mut orchestrator =
        Orchestrator::new(executor, options.style, options.quiet, options.verbose);
    let outcome = orchestrator.execute(&plan.target, &plan.commands, &plan.hooks);
    Ok(ExitCode::from(&outcome))
}
