mod script;

use std::ffi::OsString;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, CommandFactory, Parser, Subcommand};

use uvtask::commands::script::{Registry, UnknownCommand};
use uvtask::help::{render_script_help, render_script_list};
use uvtask::load_registry;
use uvtask::logger;
use uvtask::messages::{ColorChoice, Style};

#[derive(Parser, Debug)]
#[command(
    name = "uvtask",
    version,
    about = "Run scripts defined in pyproject.toml",
    override_usage = "uvtask [OPTIONS] [COMMAND] [ARGS]...",
    disable_help_flag = true,
    disable_help_subcommand = true
)]
struct Cli {
    /// Use quiet output (-q hides command stdout, -qq hides stderr too)
    #[arg(short, long, action = ArgAction::Count)]
    quiet: u8,

    /// Use verbose output (-v shows what runs, -vv enables debug logging)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Control colors in output
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,

    /// Skip pre and post hooks
    #[arg(long, visible_alias = "ignore-scripts")]
    no_hooks: bool,

    /// Path to config file (pyproject.toml in the current directory if not specified)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file path (writes log records in addition to stderr)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print help
    #[arg(short, long, action = ArgAction::SetTrue)]
    help: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show help for uvtask or one of its scripts
    #[command(hide = true)]
    Help {
        /// A script named `help` receives these as its arguments instead
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    #[command(external_subcommand)]
    Script(Vec<String>),
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse_from(normalize_help_flag(std::env::args_os()));

    let log_file = cli.log_file.as_deref().map(File::create).transpose()?;
    logger::init(cli.verbose, cli.quiet, log_file)?;

    let style = Style::new(cli.color);
    let (registry, config_path) = load_registry(cli.config.as_deref())?;
    log::debug!("Using scripts from {}", config_path.display());

    if cli.help {
        return print_help(&registry, style);
    }
    let options = script::RunOptions {
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_hooks: cli.no_hooks,
        style,
    };
    match cli.command {
        None => print_help(&registry, style),
        // A project script called `help` wins over the built-in subcommand
        Some(Commands::Help { args }) if registry.contains("help") => {
            script::run("help", &args, &registry, &options)
        }
        Some(Commands::Help { args }) => match args.first() {
            None => print_help(&registry, style),
            Some(name) => match render_script_help(name, &registry, style) {
                Ok(text) => {
                    print!("{text}");
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => Ok(unknown_command(&e, style)),
            },
        },
        Some(Commands::Script(args)) => {
            let Some((target, args)) = args.split_first() else {
                return print_help(&registry, style);
            };
            script::run(target, args, &registry, &options)
        }
    }
}

/// Rewrite `-help` to `--help` among uvtask's own options. Arguments after the
/// script name are left alone.
fn normalize_help_flag(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    let mut normalized = Vec::new();
    let mut own_options = true;
    let mut takes_value = false;
    for (index, arg) in args.into_iter().enumerate() {
        if index == 0 || !own_options {
            normalized.push(arg);
            continue;
        }
        if takes_value {
            takes_value = false;
            normalized.push(arg);
            continue;
        }
        match arg.to_str() {
            Some("-help") => normalized.push(OsString::from("--help")),
            Some("-c" | "--config" | "--color" | "--log-file") => {
                takes_value = true;
                normalized.push(arg);
            }
            Some(option) if option.starts_with('-') => normalized.push(arg),
            _ => {
                own_options = false;
                normalized.push(arg);
            }
        }
    }
    normalized
}

/// Print clap's help with the project's scripts appended
fn print_help(registry: &Registry, style: Style) -> Result<ExitCode, Box<dyn std::error::Error>> {
    Cli::command()
        .after_help(render_script_list(registry, style))
        .print_help()?;
    Ok(ExitCode::SUCCESS)
}

/// Report a script name that is not in the registry
pub(crate) fn unknown_command(err: &UnknownCommand, style: Style) -> ExitCode {
    eprintln!("{} {err}", style.failure("Error:"));
    if let Some(ref suggestion) = err.suggestion {
        eprintln!("Did you mean '{}'?", style.accent(suggestion));
    }
    eprintln!("Run 'uvtask --help' to see available commands.");
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(args: &[&str]) -> Vec<String> {
        normalize_help_flag(args.iter().map(OsString::from))
            .into_iter()
            .map(|arg| arg.into_string().unwrap())
            .collect()
    }

    #[test]
    fn test_single_dash_help_rewritten() {
        assert_eq!(normalize(&["uvtask", "-help"]), ["uvtask", "--help"]);
        assert_eq!(normalize(&["uvtask", "-v", "-help"]), ["uvtask", "-v", "--help"]);
    }

    #[test]
    fn test_script_args_left_alone() {
        assert_eq!(
            normalize(&["uvtask", "test", "-help"]),
            ["uvtask", "test", "-help"]
        );
        assert_eq!(
            normalize(&["uvtask", "-c", "-help", "test"]),
            ["uvtask", "-c", "-help", "test"]
        );
    }

    #[test]
    fn test_help_subcommand_keeps_trailing_args() {
        let cli = Cli::parse_from(["uvtask", "help", "--flag", "x"]);
        match cli.command {
            Some(Commands::Help { args }) => assert_eq!(args, ["--flag", "x"]),
            other => panic!("Expected Help, got: {other:?}"),
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
