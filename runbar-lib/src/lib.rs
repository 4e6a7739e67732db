#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for runbar
//!
//! Runs a user-supplied, long-running function in the background and shows a progress
//! window with a predicted completion time. The window closes by itself when the function
//! returns, and stays open showing the error details when it fails.
//!
//! # Module Organization
//!
//! - [`work`]: Background execution, progress prediction, and outcome capture
//! - [`display`]: Rendering of progress and outcomes onto a window surface
//! - [`commands`]: Command-line interface and the main window
//!
//! # Example
//!
//! ```no_run
//! use core::time::Duration;
//! use indicatif::MultiProgress;
//! use runbar_lib::display::{ProgressDisplay, TerminalWindow};
//! use runbar_lib::work::{OutcomeEvent, WorkSpec, Worker};
//!
//! # async fn example() -> runbar_lib::Result<()> {
//! let spec = WorkSpec::infallible("heavy_function", Duration::from_secs(7), || {
//!     std::thread::sleep(Duration::from_secs(5));
//!     50
//! })?;
//!
//! let mut display = ProgressDisplay::new(TerminalWindow::new(MultiProgress::new(), true));
//! if let OutcomeEvent::Success(value) = display.show(spec, &Worker::default()).await? {
//!     println!("returned {value}");
//! }
//! # Ok(())
//! # }
//! ```

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub mod display;
pub mod work;

pub use crate::commands::{Host, run};
