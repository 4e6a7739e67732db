//! Demonstration workloads started from the main window.

use crate::Result;
use crate::work::WorkSpec;
use core::fmt::{Display, Formatter};
use core::time::Duration;
use serde::{Deserialize, Serialize};
use std::thread;

/// Log target for workloads
const LOG_TARGET: &str = "  workload";

/// Sleep steps taken per value by [`Workload::Sum`].
const SUM_STEPS_PER_VALUE: u32 = 10;

/// A slow function to run in the background.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Workload {
    /// Sleep `iterations` steps, then return `iterations * 10`.
    Count { iterations: u64 },

    /// Like `Count`, but fail with a [`ValueError`] on step `fail_at` (zero-based).
    FailAt { iterations: u64, fail_at: u64 },

    /// Sleep one step per value and return the sum of the values.
    Sum { values: Vec<f64> },
}

/// The value returned by a workload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkloadValue {
    Count(u64),
    Sum(f64),
}

impl Display for WorkloadValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Sum(total) => write!(f, "{total}"),
        }
    }
}

/// The error raised by a failing workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueError(pub String);

impl Display for ValueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::error::Error for ValueError {}

impl Workload {
    /// The prediction-history key: the workload's kind together with its arguments.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Count { iterations } => format!("count({iterations})"),
            Self::FailAt { iterations, fail_at } => format!("fail_at({iterations}, {fail_at})"),
            Self::Sum { values } => format!("sum({values:?})"),
        }
    }

    /// Run the workload on the current thread, sleeping `step` per unit of work.
    pub fn execute(&self, step: Duration) -> Result<WorkloadValue, ValueError> {
        match self {
            Self::Count { iterations } => Ok(WorkloadValue::Count(count(*iterations, None, step)?)),
            Self::FailAt { iterations, fail_at } => Ok(WorkloadValue::Count(count(*iterations, Some(*fail_at), step)?)),
            Self::Sum { values } => Ok(WorkloadValue::Sum(sum(values, step))),
        }
    }

    /// Describe this workload as a background run.
    ///
    /// # Errors
    ///
    /// Returns an error if `estimate` is zero.
    pub fn into_work_spec(self, name: &str, estimate: Duration, step: Duration) -> Result<WorkSpec<WorkloadValue>> {
        let key = self.key();
        Ok(WorkSpec::new(name, estimate, move || self.execute(step))?.with_key(key))
    }
}

fn count(iterations: u64, fail_at: Option<u64>, step: Duration) -> Result<u64, ValueError> {
    for i in 0..iterations {
        thread::sleep(step);
        log::debug!(target: LOG_TARGET, "Count: {}", i + 1);

        if fail_at == Some(i) {
            return Err(ValueError(format!("{}!!", spelled(i))));
        }
    }

    Ok(iterations.saturating_mul(10))
}

/// Spell small numbers out the way a person would shout them.
fn spelled(n: u64) -> String {
    const WORDS: [&str; 11] = ["Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten"];
    usize::try_from(n)
        .ok()
        .and_then(|i| WORDS.get(i))
        .map_or_else(|| n.to_string(), |word| (*word).to_string())
}

fn sum(values: &[f64], step: Duration) -> f64 {
    let mut total = 0.0;
    for value in values {
        for _ in 0..SUM_STEPS_PER_VALUE {
            thread::sleep(step / SUM_STEPS_PER_VALUE);
        }
        total += value;
        log::debug!(target: LOG_TARGET, "Sum: {value}");
    }

    total
}
