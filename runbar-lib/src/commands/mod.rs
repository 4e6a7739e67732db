//! Command-line interface and orchestration for runbar
//!
//! This module implements the CLI commands and wires the worker and display together.
//! It handles argument parsing, configuration management, and the main window.
//!
//! ## Commands
//!
//! - **start** (default): open the main window, start every configured job concurrently
//!   with its own progress window, report each returned value or error, and take commands
//!   to start jobs again until the user quits
//! - **init**: generate a default configuration file with example jobs
//!
//! Configuration is managed through a TOML file listing the jobs and the prediction
//! settings shared by all of them.

mod config;
mod host;
mod init;
mod main_window;
mod run;
mod start;
mod workload;

#[cfg(debug_assertions)]
pub use config::{Config, JobConfig};
#[cfg(debug_assertions)]
pub use main_window::{Finished, MainWindow, StartStatus};
#[cfg(debug_assertions)]
pub use workload::{Workload, WorkloadValue};

pub use host::Host;
pub use init::{InitArgs, init_config};
pub use run::run;
pub use start::{StartArgs, start_jobs};
