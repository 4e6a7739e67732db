//! Jobs started from the main window, each running behind its own progress display.

use super::config::JobConfig;
use super::workload::WorkloadValue;
use crate::Result;
use crate::display::{ProgressDisplay, Surface};
use crate::work::{OutcomeEvent, Worker};
use core::fmt::{Debug, Formatter};
use core::time::Duration;
use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use ohno::bail;
use std::collections::HashSet;

/// Log target for the main window
const LOG_TARGET: &str = "      main";

/// What happened when the main window was asked to start a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStatus {
    Started,

    /// The job's previous run is still in progress, so it was not started again.
    AlreadyRunning,
}

/// How one run of a job ended.
#[derive(Debug)]
pub struct Finished<S> {
    pub name: String,
    pub display: ProgressDisplay<S>,
    pub outcome: OutcomeEvent<WorkloadValue>,
}

/// Starts configured jobs through a single [`Worker`], so every run of a job refines the
/// prediction for the next one.
///
/// A job can be started again once its previous run has ended. `new_surface` creates the
/// window for each run.
pub struct MainWindow<S, F> {
    jobs: Vec<JobConfig>,
    worker: Worker,
    new_surface: F,
    running: HashSet<String>,
    runs: FuturesUnordered<BoxFuture<'static, (String, Result<Finished<S>>)>>,
}

impl<S, F> MainWindow<S, F>
where
    S: Surface + 'static,
    F: FnMut(&JobConfig) -> S,
{
    #[must_use]
    pub fn new(jobs: Vec<JobConfig>, worker: Worker, new_surface: F) -> Self {
        Self {
            jobs,
            worker,
            new_surface,
            running: HashSet::new(),
            runs: FuturesUnordered::new(),
        }
    }

    #[must_use]
    pub fn jobs(&self) -> &[JobConfig] {
        &self.jobs
    }

    #[must_use]
    pub fn is_running(&self, name: &str) -> bool {
        self.running.contains(name)
    }

    #[must_use]
    pub fn has_running(&self) -> bool {
        !self.running.is_empty()
    }

    /// How long the next run of `job` is expected to take.
    #[must_use]
    pub fn predicted(&self, job: &JobConfig) -> Duration {
        self.worker.history().predict(&job.key()).unwrap_or(job.estimate)
    }

    /// Start the named job in a new progress window.
    ///
    /// # Errors
    ///
    /// Returns an error if no job has that name.
    pub fn start(&mut self, name: &str) -> Result<StartStatus> {
        if self.is_running(name) {
            log::debug!(target: LOG_TARGET, "'{name}' is still running");
            return Ok(StartStatus::AlreadyRunning);
        }

        let Some(job) = self.jobs.iter().find(|job| job.name == name) else {
            bail!("unknown job '{name}'");
        };

        let spec = job.work_spec()?;
        let mut display = ProgressDisplay::new((self.new_surface)(job));
        let worker = self.worker.clone();
        let name = job.name.clone();

        log::info!(target: LOG_TARGET, "Starting '{name}'");
        let _ = self.running.insert(name.clone());
        self.runs.push(Box::pin(async move {
            let result = display.show(spec, &worker).await;
            let finished = result.map(|outcome| Finished {
                name: name.clone(),
                display,
                outcome,
            });
            (name, finished)
        }));

        Ok(StartStatus::Started)
    }

    /// Wait for the next run to end, or return `None` if nothing is running.
    pub async fn next_finished(&mut self) -> Option<Result<Finished<S>>> {
        let (name, result) = self.runs.next().await?;
        let _ = self.running.remove(&name);
        Some(result)
    }
}

impl<S, F> Debug for MainWindow<S, F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MainWindow")
            .field("jobs", &self.jobs)
            .field("worker", &self.worker)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}
