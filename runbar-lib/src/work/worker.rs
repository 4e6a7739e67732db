use super::panic_capture::catch_panic;
use super::{Failure, OutcomeEvent, PredictionHistory, ProgressClock, ProgressEvent, WorkSpec};
use core::time::Duration;
use std::time::Instant;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;

/// Log target for the worker
const LOG_TARGET: &str = "    worker";

/// Default upper bound on the time between progress events (10 Hz).
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// Default floor for the remaining-time estimate while a run is in progress.
pub const DEFAULT_MIN_REMAINING: Duration = Duration::from_millis(100);

/// Runs functions in the background and reports their progress and outcome.
///
/// A worker is cheap to clone; clones share the same [`PredictionHistory`].
#[derive(Debug, Clone)]
pub struct Worker {
    history: PredictionHistory,
    refresh_interval: Duration,
    min_remaining: Duration,
}

impl Worker {
    #[must_use]
    pub const fn new(history: PredictionHistory) -> Self {
        Self {
            history,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            min_remaining: DEFAULT_MIN_REMAINING,
        }
    }

    /// Set the upper bound on the time between progress events.
    #[must_use]
    pub const fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    /// Set the floor for the remaining-time estimate while the function is still running.
    #[must_use]
    pub const fn with_min_remaining(mut self, min_remaining: Duration) -> Self {
        self.min_remaining = min_remaining;
        self
    }

    #[must_use]
    pub const fn history(&self) -> &PredictionHistory {
        &self.history
    }

    /// Start running `spec` in the background.
    ///
    /// The function executes on Tokio's blocking pool. `on_progress` is invoked zero or more
    /// times with non-decreasing fractions, then `on_outcome` is invoked exactly once. Both
    /// callbacks are invoked from the same task, in that order, and never after the outcome.
    /// Errors and panics raised by the function are reported through `on_outcome` and never
    /// propagate to the caller.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run<T, P, O>(&self, spec: WorkSpec<T>, on_progress: P, on_outcome: O) -> JoinHandle<()>
    where
        T: Send + 'static,
        P: FnMut(ProgressEvent) + Send + 'static,
        O: FnOnce(OutcomeEvent<T>) + Send + 'static,
    {
        tokio::spawn(drive(self.clone(), spec, on_progress, on_outcome))
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new(PredictionHistory::default())
    }
}

async fn drive<T, P, O>(worker: Worker, spec: WorkSpec<T>, mut on_progress: P, on_outcome: O)
where
    T: Send + 'static,
    P: FnMut(ProgressEvent) + Send + 'static,
    O: FnOnce(OutcomeEvent<T>) + Send + 'static,
{
    let key = spec.key().to_string();
    worker.history.seed(&key, spec.estimated_duration());
    let predicted = worker.history.predict(&key).unwrap_or_else(|| spec.estimated_duration());

    log::info!(target: LOG_TARGET, "Starting '{key}', predicted to take {:.3}s", predicted.as_secs_f64());

    let mut clock = ProgressClock::new(predicted, worker.min_remaining);
    let mut ticker = tokio::time::interval(clock.tick_interval(worker.refresh_interval));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let function = spec.into_function();
    let started = Instant::now();
    let mut task = tokio::task::spawn_blocking(move || match catch_panic(function) {
        Ok(Ok(value)) => OutcomeEvent::Success(value),
        Ok(Err(failure)) | Err(failure) => OutcomeEvent::Failure(failure),
    });

    let outcome = loop {
        tokio::select! {
            biased;

            _ = ticker.tick() => on_progress(clock.sample(started.elapsed())),
            joined = &mut task => break joined.unwrap_or_else(|e| OutcomeEvent::Failure(join_failure(&e))),
        }
    };

    let elapsed = started.elapsed();
    worker.history.record(&key, elapsed);

    match &outcome {
        OutcomeEvent::Success(_) => {
            log::info!(target: LOG_TARGET, "Finished '{key}' in {:.3}s", elapsed.as_secs_f64());
            on_progress(ProgressEvent::complete());
        }
        OutcomeEvent::Failure(failure) => {
            log::warn!(target: LOG_TARGET, "'{key}' failed after {:.3}s: {failure}", elapsed.as_secs_f64());
        }
    }

    on_outcome(outcome);
}

fn join_failure(error: &JoinError) -> Failure {
    Failure::new("JoinError", error.to_string(), format!("{error:?}"))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::work::RunEvent;
    use core::error::Error;
    use core::fmt::{Debug, Display, Formatter};
    use core::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct ValueError(&'static str);

    impl Display for ValueError {
        fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
            f.write_str(self.0)
        }
    }

    impl Error for ValueError {}

    /// Run `spec` to completion and collect every event in emission order.
    async fn collect<T: Debug + Send + 'static>(worker: &Worker, spec: WorkSpec<T>) -> Vec<RunEvent<T>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let progress_events = Arc::clone(&events);
        let outcome_events = Arc::clone(&events);

        worker
            .run(
                spec,
                move |e| progress_events.lock().unwrap().push(RunEvent::Progress(e)),
                move |o| outcome_events.lock().unwrap().push(RunEvent::Outcome(o)),
            )
            .await
            .unwrap();

        Arc::try_unwrap(events).unwrap().into_inner().unwrap()
    }

    fn assert_well_formed<T>(events: &[RunEvent<T>]) {
        let (last, progress) = events.split_last().expect("at least one event");
        assert!(matches!(last, RunEvent::Outcome(_)), "outcome must come last");

        let mut previous = 0.0;
        for event in progress {
            let RunEvent::Progress(p) = event else {
                unreachable!("outcome must be emitted exactly once");
            };
            assert!((0.0..=1.0).contains(&p.fraction_complete));
            assert!(p.fraction_complete >= previous, "fractions must not decrease");
            previous = p.fraction_complete;
        }
    }

    #[tokio::test]
    async fn test_success_after_progress() {
        let worker = Worker::default();
        let spec = WorkSpec::infallible("answer", Duration::from_secs(1), || {
            std::thread::sleep(Duration::from_millis(100));
            42
        })
        .unwrap();

        let events = collect(&worker, spec).await;

        assert_well_formed(&events);
        assert!(events.len() >= 2, "expected progress before the outcome");
        assert_eq!(events.last(), Some(&RunEvent::Outcome(OutcomeEvent::Success(42))));
        assert_eq!(events.get(events.len() - 2), Some(&RunEvent::Progress(ProgressEvent::complete())));
    }

    #[tokio::test]
    async fn test_error_becomes_failure() {
        let worker = Worker::default();
        let spec = WorkSpec::new("bad", Duration::from_secs(1), || Err::<u32, _>(ValueError("bad"))).unwrap();

        let events = collect(&worker, spec).await;

        assert_well_formed(&events);
        let Some(RunEvent::Outcome(OutcomeEvent::Failure(failure))) = events.last() else {
            unreachable!("expected a failure outcome, got {events:?}");
        };
        assert_eq!(failure.error_kind, "ValueError");
        assert_eq!(failure.message, "bad");
        assert!(failure.trace.contains("ValueError"));
        assert!(
            !events.contains(&RunEvent::Progress(ProgressEvent::complete())),
            "a failed run must not report completion"
        );
    }

    #[tokio::test]
    async fn test_boxed_error_keeps_its_kind() {
        let worker = Worker::default();
        let spec = WorkSpec::new("boxed", Duration::from_secs(1), || {
            Err::<u32, Box<dyn Error + Send + Sync>>(Box::new(ValueError("bad")))
        })
        .unwrap();

        let events = collect(&worker, spec).await;

        let Some(RunEvent::Outcome(OutcomeEvent::Failure(failure))) = events.last() else {
            unreachable!("expected a failure outcome, got {events:?}");
        };
        assert_eq!(failure.error_kind, "ValueError");
        assert_eq!(failure.message, "bad");
    }

    #[tokio::test]
    #[expect(clippy::panic, reason = "a progress callback that dies takes the driver task with it")]
    async fn test_dead_driver_reports_no_outcome() {
        let worker = Worker::default();
        let spec = WorkSpec::infallible("orphan", Duration::from_secs(1), || 1).unwrap();
        let outcome_reported = Arc::new(AtomicBool::new(false));
        let reported = Arc::clone(&outcome_reported);

        let joined = worker
            .run(spec, |_| panic!("progress window went away"), move |_| reported.store(true, Ordering::SeqCst))
            .await;

        assert!(joined.unwrap_err().is_panic());
        assert!(!outcome_reported.load(Ordering::SeqCst));
    }

    #[tokio::test]
    #[expect(clippy::panic, reason = "exercising panic capture")]
    async fn test_panic_becomes_failure() {
        let worker = Worker::default();
        let spec = WorkSpec::infallible("explode", Duration::from_secs(1), || -> u32 { panic!("Five!!") }).unwrap();

        let events = collect(&worker, spec).await;

        assert_well_formed(&events);
        let Some(RunEvent::Outcome(OutcomeEvent::Failure(failure))) = events.last() else {
            unreachable!("expected a failure outcome, got {events:?}");
        };
        assert!(failure.is_panic());
        assert_eq!(failure.message, "Five!!");
        assert!(!failure.trace.is_empty());
    }

    #[tokio::test]
    async fn test_elapsed_time_is_recorded() {
        let history = PredictionHistory::new(3);
        let worker = Worker::new(history.clone());
        let spec = WorkSpec::infallible("quick", Duration::from_secs(60), || ()).unwrap();

        let _ = collect(&worker, spec).await;

        // The seed (60s) and a near-zero actual duration average to about 30s
        let predicted = history.predict("quick").unwrap();
        assert!(predicted < Duration::from_secs(31));
        assert!(predicted >= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_concurrent_runs_are_independent() {
        let worker = Worker::default().with_refresh_interval(Duration::from_millis(20));
        let fast = WorkSpec::infallible("fast", Duration::from_millis(200), || {
            std::thread::sleep(Duration::from_millis(50));
            "fast"
        })
        .unwrap();
        let slow = WorkSpec::infallible("slow", Duration::from_secs(5), || {
            std::thread::sleep(Duration::from_millis(120));
            "slow"
        })
        .unwrap();

        let (fast_events, slow_events) = tokio::join!(collect(&worker, fast), collect(&worker, slow));

        assert_well_formed(&fast_events);
        assert_well_formed(&slow_events);
        assert_eq!(fast_events.last(), Some(&RunEvent::Outcome(OutcomeEvent::Success("fast"))));
        assert_eq!(slow_events.last(), Some(&RunEvent::Outcome(OutcomeEvent::Success("slow"))));

        // Each stream counts down from its own prediction
        let RunEvent::Progress(first_slow) = &slow_events[0] else {
            unreachable!("first event must be progress");
        };
        assert!(first_slow.estimated_remaining > Duration::from_secs(4));
    }
}
