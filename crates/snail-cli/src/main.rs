use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand, ValueEnum};

mod completion;
mod dispatch;
mod remote;
mod render;

use dispatch::run_cli;
use render::{current_error_style, render_error_line};

#[derive(Parser, Debug)]
#[command(name = "snail")]
#[command(about = "Patches the Slack desktop app to load Snail", long_about = None)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Log pipeline progress (overridden by RUST_LOG).
    #[arg(long, global = true)]
    verbose: bool,
    #[command(flatten)]
    patch: PatchArgs,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default)]
struct TargetArgs {
    /// Operating system of the Slack install: darwin, windows or linux.
    #[arg(long = "os", value_name = "OS")]
    os: Option<String>,
    /// Slack installation path; detected when omitted.
    #[arg(long, value_name = "PATH")]
    slack_location: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
struct PatchArgs {
    #[command(flatten)]
    target: TargetArgs,
    /// CPU architecture; informational only.
    #[arg(long, value_name = "ARCH")]
    arch: Option<String>,
    #[arg(long, value_name = "URL")]
    server_url: Option<String>,
    #[arg(long)]
    no_clear_quarantine: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Patch Slack (default when no subcommand is given).
    Patch(PatchArgs),
    /// Check that a Slack installation with an app.asar exists.
    Verify(TargetArgs),
    /// List app.asar backups, newest first.
    Backups,
    /// Put a backup back in place.
    Restore {
        backup: PathBuf,
        #[command(flatten)]
        target: TargetArgs,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Compare this build with the version the server advertises.
    Version {
        #[arg(long, value_name = "URL")]
        server_url: Option<String>,
    },
    Completions {
        #[arg(value_enum)]
        shell: CliCompletionShell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    Show,
    SetServerUrl { url: String },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum CliCompletionShell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match parse_error_message(&err) {
            Some(message) => {
                eprintln!("{}", render_error_line(current_error_style(), &message));
                return ExitCode::FAILURE;
            }
            None => err.exit(),
        },
    };
    init_tracing(cli.verbose);

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!(
                "{}",
                render_error_line(current_error_style(), &format!("{err:#}"))
            );
            ExitCode::FAILURE
        }
    }
}

/// `None` for help and version requests, which clap prints itself.
fn parse_error_message(err: &clap::Error) -> Option<String> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => None,
        _ => {
            let rendered = err.render().to_string();
            let message = rendered.trim();
            Some(message.strip_prefix("error: ").unwrap_or(message).to_string())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "info,snail_installer=info,snail_core=info"
    } else {
        "warn"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
