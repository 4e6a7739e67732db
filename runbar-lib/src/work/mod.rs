//! Background execution of user-supplied functions.
//!
//! A [`Worker`] takes a [`WorkSpec`], runs its function off the caller's task and
//! reports through two callbacks: zero or more [`ProgressEvent`]s followed by exactly
//! one [`OutcomeEvent`]. Errors returned by the function, as well as panics, are
//! captured at the worker boundary and reported as [`Failure`]s.
//!
//! # Prediction
//!
//! Progress is predicted rather than measured. Each run counts down from a predicted
//! duration taken from the [`PredictionHistory`]: the mean of the last few actual
//! durations recorded under the spec's key. The first run of a key is seeded with the
//! spec's own estimate. See [`ProgressClock`] for how elapsed time maps to events.

mod outcome_event;
mod panic_capture;
mod prediction_history;
mod progress_clock;
mod progress_event;
mod work_spec;
mod worker;

pub use outcome_event::{Failure, OutcomeEvent, RunEvent};
pub use prediction_history::{DEFAULT_HISTORY_LEN, PredictionHistory};
pub use progress_clock::ProgressClock;
pub use progress_event::ProgressEvent;
pub use work_spec::WorkSpec;
pub use worker::{DEFAULT_MIN_REMAINING, DEFAULT_REFRESH_INTERVAL, Worker};
