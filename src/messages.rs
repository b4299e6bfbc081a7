//! Styled diagnostics written to stderr while scripts run

use std::io::{self, IsTerminal, Write};

use anstyle::{AnsiColor, Color, RgbColor};

use crate::run::Phase;

const ACCENT: anstyle::Style =
    anstyle::Style::new().fg_color(Some(Color::Rgb(RgbColor(207, 106, 76))));
const SUCCESS: anstyle::Style = anstyle::Style::new()
    .fg_color(Some(Color::Ansi(AnsiColor::Green)))
    .bold();
const FAILURE: anstyle::Style = anstyle::Style::new()
    .fg_color(Some(Color::Ansi(AnsiColor::Red)))
    .bold();
const HEADER: anstyle::Style = anstyle::Style::new().bold();
const DIM: anstyle::Style = anstyle::Style::new().dimmed();

/// When to emit ANSI color codes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorChoice {
    /// Color when stderr is a terminal and `NO_COLOR` is unset
    #[default]
    Auto,
    Always,
    Never,
}

/// Color helper, a no-op when color is disabled
#[derive(Debug, Clone, Copy)]
pub struct Style {
    color: bool,
}

impl Style {
    #[must_use]
    pub fn new(choice: ColorChoice) -> Self {
        let color = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                std::env::var_os("NO_COLOR").is_none() && io::stderr().is_terminal()
            }
        };
        Self { color }
    }

    #[must_use]
    pub fn plain() -> Self {
        Self { color: false }
    }

    fn paint(self, style: anstyle::Style, s: &str) -> String {
        if self.color {
            format!("{style}{s}{style:#}")
        } else {
            s.to_string()
        }
    }

    #[must_use]
    pub fn accent(self, s: &str) -> String {
        self.paint(ACCENT, s)
    }

    #[must_use]
    pub fn success(self, s: &str) -> String {
        self.paint(SUCCESS, s)
    }

    #[must_use]
    pub fn failure(self, s: &str) -> String {
        self.paint(FAILURE, s)
    }

    #[must_use]
    pub fn header(self, s: &str) -> String {
        self.paint(HEADER, s)
    }

    #[must_use]
    pub fn dim(self, s: &str) -> String {
        self.paint(DIM, s)
    }

    /// Exit code, green when zero and red otherwise
    #[must_use]
    pub fn exit_code(self, code: i32) -> String {
        let text = code.to_string();
        if code == 0 {
            self.success(&text)
        } else {
            self.failure(&text)
        }
    }
}

/// Writes orchestrator diagnostics. Write errors are ignored, a closed stderr
/// must not change exit codes.
pub struct Reporter<W: Write = io::Stderr> {
    out: W,
    style: Style,
}

impl Reporter {
    #[must_use]
    pub fn stderr(style: Style) -> Self {
        Self::new(io::stderr(), style)
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, style: Style) -> Self {
        Self { out, style }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn list(&mut self, label: &str, commands: &[String]) {
        let label = self.style.header(label);
        if commands.is_empty() {
            let _ = writeln!(self.out, "  {label} {}", self.style.dim("(none)"));
            return;
        }
        let _ = writeln!(self.out, "  {label}");
        for command in commands {
            let _ = writeln!(self.out, "    {}", self.style.accent(command));
        }
    }

    /// Print the target and everything that is about to run
    pub fn execution_info(
        &mut self,
        target: &str,
        commands: &[String],
        pre: &[String],
        post: &[String],
    ) {
        let _ = writeln!(self.out, "{} {target}", self.style.header("Command:"));
        self.list("Pre-hooks:", pre);
        self.list("Commands:", commands);
        self.list("Post-hooks:", post);
    }

    pub fn phase_finished(&mut self, phase: Phase, exit_code: i32) {
        let _ = writeln!(
            self.out,
            "{} {}",
            self.style.dim(&format!("{} finished with exit code", phase.title())),
            self.style.exit_code(exit_code)
        );
    }

    pub fn failure(&mut self, phase: Phase, command: &str, exit_code: i32) {
        let _ = writeln!(
            self.out,
            "{} {} {}",
            self.style.failure(&format!("{phase} failed with exit code {exit_code}:")),
            command,
            self.style.dim(&format!("({})", phase.failure_kind()))
        );
    }

    pub fn interrupted(&mut self, command: &str) {
        let _ = writeln!(self.out, "{} {command}", self.style.failure("Interrupted:"));
    }

    pub fn final_exit_code(&mut self, exit_code: i32) {
        let _ = writeln!(
            self.out,
            "{} {}",
            self.style.header("Exit code:"),
            self.style.exit_code(exit_code)
        );
    }
}
