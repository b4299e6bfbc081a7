//! Runs one invocation: pre-hooks, then the resolved commands, then post-hooks.
//!
//! Every phase is fail-fast. The first command that exits non-zero, or is
//! interrupted, ends the whole invocation and decides its exit code. Nothing in
//! here exits the process; the caller turns the [`RunOutcome`] into an exit code.

use std::fmt;
use std::io::{self, Write};
use std::process::ExitCode;

use log::debug;

use crate::commands::hooks::HookPair;
use crate::executor::{ExecStatus, Executor};
use crate::messages::{Reporter, Style};

/// Exit code reported when the user interrupts a running command
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreHooks,
    Commands,
    PostHooks,
}

impl Phase {
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Phase::PreHooks => "Pre-hooks",
            Phase::Commands => "Commands",
            Phase::PostHooks => "Post-hooks",
        }
    }

    #[must_use]
    pub fn failure_kind(self) -> &'static str {
        match self {
            Phase::PreHooks => "pre-hook failure",
            Phase::Commands => "command failure",
            Phase::PostHooks => "post-hook failure",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::PreHooks => write!(f, "Pre-hook"),
            Phase::Commands => write!(f, "Command"),
            Phase::PostHooks => write!(f, "Post-hook"),
        }
    }
}

/// How an invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failed {
        phase: Phase,
        command: String,
        exit_code: i32,
    },
    Interrupted {
        phase: Phase,
        command: String,
    },
}

impl RunOutcome {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Success => 0,
            RunOutcome::Failed { exit_code, .. } => *exit_code,
            RunOutcome::Interrupted { .. } => INTERRUPTED_EXIT_CODE,
        }
    }
}

impl From<&RunOutcome> for ExitCode {
    fn from(outcome: &RunOutcome) -> Self {
        u8::try_from(outcome.exit_code()).map_or(ExitCode::FAILURE, ExitCode::from)
    }
}

/// Drives an [`Executor`] through the phases of one invocation
pub struct Orchestrator<E, W: Write = io::Stderr> {
    executor: E,
    reporter: Reporter<W>,
    quiet: u8,
    verbose: u8,
}

impl<E: Executor> Orchestrator<E> {
    pub fn new(executor: E, style: Style, quiet: u8, verbose: u8) -> Self {
        Self::with_reporter(executor, Reporter::stderr(style), quiet, verbose)
    }
}

impl<E: Executor, W: Write> Orchestrator<E, W> {
    pub fn with_reporter(executor: E, reporter: Reporter<W>, quiet: u8, verbose: u8) -> Self {
        Self {
            executor,
            reporter,
            quiet,
            verbose,
        }
    }

    #[cfg(test)]
    fn executor(&self) -> &E {
        &self.executor
    }

    pub fn into_parts(self) -> (E, Reporter<W>) {
        (self.executor, self.reporter)
    }

    /// Run `hooks.pre`, `commands` and `hooks.post` in order, stopping at the first failure.
    pub fn execute(&mut self, target: &str, commands: &[String], hooks: &HookPair) -> RunOutcome {
        if self.verbose >= 1 {
            self.reporter
                .execution_info(target, commands, &hooks.pre, &hooks.post);
        }

        let outcome = self.run_phases(commands, hooks);
        debug!("Invocation of '{target}' ended with {outcome:?}");

        if self.quiet < 2 {
            match &outcome {
                RunOutcome::Success => {}
                RunOutcome::Failed {
                    phase,
                    command,
                    exit_code,
                } => self.reporter.failure(*phase, command, *exit_code),
                RunOutcome::Interrupted { command, .. } => self.reporter.interrupted(command),
            }
        }
        if self.verbose >= 1 {
            self.reporter.final_exit_code(outcome.exit_code());
        }
        outcome
    }

    fn run_phases(&mut self, commands: &[String], hooks: &HookPair) -> RunOutcome {
        let phases = [
            (Phase::PreHooks, hooks.pre.as_slice()),
            (Phase::Commands, commands),
            (Phase::PostHooks, hooks.post.as_slice()),
        ];
        for (phase, phase_commands) in phases {
            if phase_commands.is_empty() {
                continue;
            }
            let outcome = self.run_phase(phase, phase_commands);
            if self.verbose >= 1 {
                self.reporter.phase_finished(phase, outcome.exit_code());
            }
            if outcome != RunOutcome::Success {
                return outcome;
            }
        }
        RunOutcome::Success
    }

    fn run_phase(&mut self, phase: Phase, commands: &[String]) -> RunOutcome {
        for command in commands {
            match self.executor.execute(command, self.quiet, self.verbose) {
                ExecStatus::Exited(0) => {}
                ExecStatus::Exited(exit_code) => {
                    return RunOutcome::Failed {
                        phase,
                        command: command.clone(),
                        exit_code,
                    };
                }
                ExecStatus::Interrupted => {
                    return RunOutcome::Interrupted {
                        phase,
                        command: command.clone(),
                    };
                }
            }
        }
        RunOutcome::Success
    }
}
