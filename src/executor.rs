//! Spawning of single shell commands

use std::future::poll_fn;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::task::Poll;

use log::{debug, error};
use tokio::process::Command as ProcessCommand;
use tokio::runtime::Runtime;

use crate::messages::Style;

/// Conventional exit code for "command not found"
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

#[cfg(unix)]
const SIGINT: i32 = 2;

#[cfg(unix)]
type Interrupts = tokio::signal::unix::Signal;
#[cfg(windows)]
type Interrupts = tokio::signal::windows::CtrlC;

#[cfg(unix)]
fn listen_for_interrupts() -> io::Result<Interrupts> {
    tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
}

#[cfg(windows)]
fn listen_for_interrupts() -> io::Result<Interrupts> {
    tokio::signal::windows::ctrl_c()
}

/// Result of running one shell command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    Exited(i32),
    /// The user pressed Ctrl+C while the command was running
    Interrupted,
}

/// Runs one command string and waits for it to finish
pub trait Executor {
    /// `quiet`: 1 discards the command's stdout, 2 discards stderr too.
    /// `verbose`: 1 or more echoes the command and its exit code.
    fn execute(&mut self, command: &str, quiet: u8, verbose: u8) -> ExecStatus;
}

/// Runs commands through the platform shell, one at a time.
///
/// Ctrl+C is watched for the whole lifetime of the executor, so an interrupt
/// that arrives between two commands is reported by the next one instead of
/// being lost.
pub struct ShellExecutor {
    runtime: Runtime,
    interrupts: Interrupts,
    style: Style,
}

impl ShellExecutor {
    /// # Errors
    ///
    /// Returns an IO error if the runtime used to wait on child processes, or
    /// the Ctrl+C listener, cannot be created.
    pub fn new(style: Style) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let interrupts = {
            let _guard = runtime.enter();
            listen_for_interrupts()?
        };
        Ok(Self {
            runtime,
            interrupts,
            style,
        })
    }
}

impl Executor for ShellExecutor {
    fn execute(&mut self, command: &str, quiet: u8, verbose: u8) -> ExecStatus {
        if verbose >= 1 {
            eprintln!("{} {command}", self.style.accent("❱"));
        }
        let status = self
            .runtime
            .block_on(run_shell(command, quiet, &mut self.interrupts));
        if verbose >= 1 {
            match status {
                ExecStatus::Exited(code) => {
                    eprintln!(
                        "{} {}",
                        self.style.dim("exit code"),
                        self.style.exit_code(code)
                    );
                }
                ExecStatus::Interrupted => eprintln!("{}", self.style.failure("interrupted")),
            }
        }
        status
    }
}

/// Consume an interrupt that has already been delivered, without waiting
async fn take_pending(interrupts: &mut Interrupts) -> bool {
    poll_fn(|cx| Poll::Ready(interrupts.poll_recv(cx).is_ready())).await
}

fn shell_command(command: &str) -> ProcessCommand {
    #[cfg(windows)]
    let mut process = {
        let mut process = ProcessCommand::new("cmd");
        process.arg("/C").arg(command);
        process
    };
    #[cfg(not(windows))]
    let mut process = {
        let mut process = ProcessCommand::new("sh");
        process.arg("-c").arg(command);
        process
    };
    process.kill_on_drop(true);
    process
}

async fn run_shell(command: &str, quiet: u8, interrupts: &mut Interrupts) -> ExecStatus {
    if take_pending(interrupts).await {
        debug!("Ctrl+C received before '{command}' started");
        return ExecStatus::Interrupted;
    }

    let mut process = shell_command(command);
    if quiet >= 1 {
        process.stdout(Stdio::null());
    }
    if quiet >= 2 {
        process.stderr(Stdio::null());
    }

    debug!("Spawning '{command}'");
    let mut child = match process.spawn() {
        Ok(child) => child,
        Err(e) => {
            error!("Unable to start '{command}': {e}");
            return ExecStatus::Exited(SPAWN_FAILURE_EXIT_CODE);
        }
    };

    let waited = tokio::select! {
        biased;
        Some(()) = interrupts.recv() => None,
        status = child.wait() => Some(status),
    };
    let Some(waited) = waited else {
        debug!("Received Ctrl+C while running '{command}'");
        let _ = child.kill().await;
        return ExecStatus::Interrupted;
    };
    // The child shares our process group, so Ctrl+C often ends it just as the
    // interrupt reaches us.
    if take_pending(interrupts).await {
        debug!("Received Ctrl+C while '{command}' was exiting");
        return ExecStatus::Interrupted;
    }
    match waited {
        Ok(status) => exec_status(status),
        Err(e) => {
            error!("Failed waiting for '{command}': {e}");
            ExecStatus::Exited(1)
        }
    }
}

fn exec_status(status: ExitStatus) -> ExecStatus {
    if let Some(code) = status.code() {
        return ExecStatus::Exited(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        match status.signal() {
            Some(SIGINT) => return ExecStatus::Interrupted,
            Some(signal) => return ExecStatus::Exited(128 + signal),
            None => {}
        }
    }
    ExecStatus::Exited(1)
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::process::ExitStatusExt;

    use parking_lot::Mutex;

    use super::*;

    /// Interrupt tests signal the whole test process, and every live
    /// `ShellExecutor` sees that signal, so shell tests take turns.
    static SHELL: Mutex<()> = Mutex::new(());

    fn run(command: &str, quiet: u8) -> ExecStatus {
        let _lock = SHELL.lock();
        ShellExecutor::new(Style::plain())
            .unwrap()
            .execute(command, quiet, 0)
    }

    #[test]
    fn test_success() {
        assert_eq!(run("true", 0), ExecStatus::Exited(0));
    }

    #[test]
    fn test_exit_code_propagated() {
        assert_eq!(run("exit 42", 0), ExecStatus::Exited(42));
    }

    #[test]
    fn test_runs_through_shell() {
        assert_eq!(run("test \"$(echo a b)\" = 'a b'", 1), ExecStatus::Exited(0));
    }

    #[test]
    fn test_quiet_levels_still_report_exit_code() {
        assert_eq!(run("echo out; echo err >&2; exit 3", 1), ExecStatus::Exited(3));
        assert_eq!(run("echo out; echo err >&2; exit 4", 2), ExecStatus::Exited(4));
    }

    #[test]
    fn test_killed_by_signal() {
        assert_eq!(run("kill -TERM $$", 0), ExecStatus::Exited(128 + 15));
    }

    #[test]
    fn test_child_killed_by_sigint_is_interrupt() {
        assert_eq!(run("kill -INT $$", 0), ExecStatus::Interrupted);
        assert_eq!(exec_status(ExitStatus::from_raw(SIGINT)), ExecStatus::Interrupted);
    }

    #[test]
    fn test_ctrl_c_reported_even_when_child_exits_cleanly() {
        let _lock = SHELL.lock();
        let mut executor = ShellExecutor::new(Style::plain()).unwrap();
        for code in [0, 5] {
            for _ in 0..20 {
                let command = format!("sleep 0.05; kill -INT $PPID; exit {code}");
                assert_eq!(executor.execute(&command, 0, 0), ExecStatus::Interrupted);
            }
        }
    }

    #[test]
    fn test_interrupt_is_consumed_once_reported() {
        let _lock = SHELL.lock();
        let mut executor = ShellExecutor::new(Style::plain()).unwrap();
        assert_eq!(
            executor.execute("kill -INT $PPID; exit 0", 0, 0),
            ExecStatus::Interrupted
        );
        assert_eq!(executor.execute("true", 0, 0), ExecStatus::Exited(0));
    }

    #[test]
    fn test_executor_reused_across_commands() {
        let _lock = SHELL.lock();
        let mut executor = ShellExecutor::new(Style::plain()).unwrap();
        assert_eq!(executor.execute("true", 0, 0), ExecStatus::Exited(0));
        assert_eq!(executor.execute("false", 0, 0), ExecStatus::Exited(1));
    }
}
