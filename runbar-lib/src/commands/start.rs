//! The `start` command: run jobs from the main window and report how each run ended.

use super::Host;
use super::config::{Config, JobConfig};
use super::main_window::{Finished, MainWindow, StartStatus};
use crate::Result;
use crate::display::TerminalWindow;
use crate::work::{Failure, OutcomeEvent, PredictionHistory, Worker};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};
use indicatif::{MultiProgress, ProgressDrawTarget};
use ohno::bail;
use std::io::{IsTerminal, Write, stderr};

/// Log target for the main window
const LOG_TARGET: &str = "      main";

/// Color mode configuration for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    /// Always use colors
    Always,

    /// Never use colors
    Never,

    /// Use colors if the output is a terminal, otherwise don't use colors
    #[default]
    Auto,
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    #[default]
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// Path to configuration file (default is `runbar.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Only start the named job (may be repeated; default is every configured job)
    #[arg(long = "job", short = 'j', value_name = "NAME")]
    pub jobs: Vec<String>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

/// Text shown once the main window is ready for commands.
const PROMPT: &str = "Type a job name to start it again, `jobs` to list jobs, `wait` to wait for running jobs, or an empty line to quit";

/// A line typed into the main window.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Start(&'a str),
    Jobs,
    Wait,
    Quit,
}

impl<'a> Command<'a> {
    fn parse(line: Option<&'a str>) -> Self {
        let Some(line) = line.map(str::trim) else {
            return Self::Quit;
        };

        match line {
            "" | "quit" | "q" => Self::Quit,
            "jobs" => Self::Jobs,
            "wait" => Self::Wait,
            _ => Self::Start(line.strip_prefix("start ").map_or(line, str::trim)),
        }
    }
}

/// What the main window reacts to next.
enum WindowEvent<S> {
    Finished(Option<Result<Finished<S>>>),
    Command(Option<String>),
}

/// Open the main window, start the selected jobs, then take commands until the user quits.
///
/// Every job runs behind its own display and all runs share one worker, so starting a job
/// again benefits from the durations of its earlier runs. A job cannot be started while its
/// previous run is still going. Returned values go to the host's output and failures to its
/// error stream as each run ends. Failed windows stay open until the job is started again or,
/// on quitting, until the host reports that the user dismissed them.
pub async fn start_jobs<H: Host>(host: &mut H, args: &StartArgs) -> Result<()> {
    init_logging(args.log_level);

    let config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
    let selected: Vec<String> = select_jobs(&config, &args.jobs)?.iter().map(|job| job.name.clone()).collect();

    let use_colors = match args.color {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => stderr().is_terminal(),
    };

    let worker = Worker::new(PredictionHistory::new(config.history_len))
        .with_refresh_interval(config.refresh_interval)
        .with_min_remaining(config.min_remaining);
    let multi = MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(10));
    let mut window = MainWindow::new(config.jobs, worker, move |_: &JobConfig| TerminalWindow::new(multi.clone(), use_colors));

    for name in &selected {
        let _ = window.start(name)?;
    }

    let _ = writeln!(host.error(), "{PROMPT}");
    let mut failed = Vec::new();

    loop {
        let event = tokio::select! {
            biased;

            finished = window.next_finished(), if window.has_running() => WindowEvent::Finished(finished),
            line = host.next_command() => WindowEvent::Command(line),
        };

        match event {
            WindowEvent::Finished(finished) => {
                if let Some(finished) = finished {
                    record(host, finished?, &mut failed);
                }
            }
            WindowEvent::Command(line) => match Command::parse(line.as_deref()) {
                Command::Quit => break,
                Command::Jobs => list_jobs(host, &window),
                Command::Wait => wait_for_runs(host, &mut window, &mut failed).await?,
                Command::Start(name) => start_again(host, &mut window, &mut failed, name)?,
            },
        }
    }

    wait_for_runs(host, &mut window, &mut failed).await?;

    if !failed.is_empty() {
        let _ = writeln!(host.error(), "Press Enter to dismiss");
        host.wait_for_dismissal().await;
        for finished in failed {
            log::debug!(target: LOG_TARGET, "Dismissing '{}'", finished.name);
            finished.display.dismiss();
        }
    }

    Ok(())
}

type Window<F> = MainWindow<TerminalWindow, F>;

fn start_again<H, F>(host: &mut H, window: &mut Window<F>, failed: &mut Vec<Finished<TerminalWindow>>, name: &str) -> Result<()>
where
    H: Host,
    F: FnMut(&JobConfig) -> TerminalWindow,
{
    if window.jobs().iter().all(|job| job.name != name) {
        let _ = writeln!(host.error(), "unknown job '{name}'");
        return Ok(());
    }

    if window.start(name)? == StartStatus::AlreadyRunning {
        let _ = writeln!(host.error(), "{name}: working now");
        return Ok(());
    }

    // The new run gets a new window, so the old failure no longer needs acknowledging
    if let Some(index) = failed.iter().position(|f| f.name == name) {
        failed.swap_remove(index).display.dismiss();
    }

    Ok(())
}

async fn wait_for_runs<H, F>(host: &mut H, window: &mut Window<F>, failed: &mut Vec<Finished<TerminalWindow>>) -> Result<()>
where
    H: Host,
    F: FnMut(&JobConfig) -> TerminalWindow,
{
    while let Some(finished) = window.next_finished().await {
        record(host, finished?, failed);
    }
    Ok(())
}

fn list_jobs<H, F>(host: &mut H, window: &Window<F>)
where
    H: Host,
    F: FnMut(&JobConfig) -> TerminalWindow,
{
    let mut out = host.output();
    for job in window.jobs() {
        let state = if window.is_running(&job.name) { "running" } else { "idle" };
        let predicted = window.predicted(job).as_secs_f64();
        let _ = writeln!(out, "{}: {state}, predicted {predicted:.1}s", job.name);
    }
}

/// Report how a run ended, keeping failed windows open.
fn record<H: Host>(host: &mut H, finished: Finished<TerminalWindow>, failed: &mut Vec<Finished<TerminalWindow>>) {
    match &finished.outcome {
        OutcomeEvent::Success(value) => {
            let _ = writeln!(host.output(), "{}: returned {value}", finished.name);
        }
        OutcomeEvent::Failure(failure) => {
            let _ = write!(host.error(), "{}", failure_report(&finished.name, failure));
            failed.push(finished);
        }
    }
}

/// Initialize logger based on log level
fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    // A second initialization (e.g. across tests) is harmless, so ignore the error
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}

/// Pick the requested jobs, in the order they were requested, or every job if none were named.
fn select_jobs<'a>(config: &'a Config, names: &[String]) -> Result<Vec<&'a JobConfig>> {
    if names.is_empty() {
        return Ok(config.jobs.iter().collect());
    }

    let mut jobs = Vec::with_capacity(names.len());
    for name in names {
        let Some(job) = config.job(name) else {
            let known = config.jobs.iter().map(|j| j.name.as_str()).collect::<Vec<_>>().join(", ");
            bail!("unknown job '{name}' (known jobs: {known})");
        };
        jobs.push(job);
    }

    Ok(jobs)
}

/// Render a failure for the error stream: a summary line followed by the indented trace.
fn failure_report(name: &str, failure: &Failure) -> String {
    let mut text = format!("{name}: raised {}: {}\n", failure.error_kind, failure.message);
    for line in failure.trace.lines() {
        text.push_str("    ");
        text.push_str(line);
        text.push('\n');
    }
    text
}
