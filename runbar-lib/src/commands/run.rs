//! Command dispatch logic for runbar

use super::{InitArgs, StartArgs, init_config, start_jobs};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "runbar", author, version, long_about = None)]
#[command(about = "Run long functions in the background behind a predicted-time progress window")]
#[command(styles = CLAP_STYLES, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<RunbarSubcommand>,

    #[command(flatten)]
    start: StartArgs,
}

#[derive(Subcommand, Debug)]
enum RunbarSubcommand {
    /// Open the main window and start the configured jobs (the default)
    Start(StartArgs),
    /// Generate a default configuration file
    Init(InitArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. Without a subcommand, the main window is opened. It's designed to be
/// called from main.rs with the program arguments.
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let cli = Cli::parse_from(args);

    match &cli.command {
        Some(RunbarSubcommand::Start(start_args)) => start_jobs(host, start_args).await,
        Some(RunbarSubcommand::Init(init_args)) => init_config(host, init_args),
        None => start_jobs(host, &cli.start).await,
    }
}
