use super::{DisplayState, Surface};
use crate::Result;
use crate::work::{OutcomeEvent, RunEvent, WorkSpec, Worker};
use ohno::{IntoAppError, bail};
use tokio::sync::mpsc;

/// Log target for the display
const LOG_TARGET: &str = "   display";

/// Shows the progress of a single run on a [`Surface`].
///
/// Events from the worker are posted into a channel and consumed on the task that
/// calls [`show`](Self::show), which never blocks on the worker itself. A display
/// handles exactly one run; create a new one for every run.
#[derive(Debug)]
pub struct ProgressDisplay<S> {
    surface: S,
    state: DisplayState,
}

impl<S: Surface> ProgressDisplay<S> {
    #[must_use]
    pub const fn new(surface: S) -> Self {
        Self {
            surface,
            state: DisplayState::Idle,
        }
    }

    #[must_use]
    pub const fn state(&self) -> DisplayState {
        self.state
    }

    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// Start `spec` on `worker` and render its events until the outcome arrives.
    ///
    /// On success the surface is closed. On failure it is left showing the error until
    /// [`dismiss`](Self::dismiss) is called. Either way the outcome is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if this display was already used for a run, or if the worker
    /// stopped without reporting an outcome.
    pub async fn show<T: Send + 'static>(&mut self, spec: WorkSpec<T>, worker: &Worker) -> Result<OutcomeEvent<T>> {
        if self.state != DisplayState::Idle {
            bail!("this display has already shown a run (state {:?})", self.state);
        }

        let title = spec.title();
        log::debug!(target: LOG_TARGET, "Opening '{title}'");
        self.surface.open(&title);
        self.state = DisplayState::Running;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let progress_tx = tx.clone();
        let handle = worker.run(
            spec,
            move |event| {
                let _ = progress_tx.send(RunEvent::Progress(event));
            },
            move |outcome| {
                let _ = tx.send(RunEvent::Outcome(outcome));
            },
        );

        while let Some(event) = rx.recv().await {
            match event {
                RunEvent::Progress(progress) => self.surface.update(&progress),
                RunEvent::Outcome(outcome) => {
                    self.finish(&outcome);
                    return Ok(outcome);
                }
            }
        }

        // The channel closed without an outcome, so the worker task must have died
        handle.await.into_app_err_with(|| format!("running '{title}'"))?;
        bail!("'{title}' stopped without reporting an outcome")
    }

    fn finish<T>(&mut self, outcome: &OutcomeEvent<T>) {
        match outcome {
            OutcomeEvent::Success(_) => {
                self.surface.close();
                self.state = DisplayState::Closed;
            }
            OutcomeEvent::Failure(failure) => {
                self.surface.show_failure(failure);
                self.state = DisplayState::ShowingError;
            }
        }
    }

    /// Release the surface after the user has acknowledged the outcome.
    pub fn dismiss(mut self) {
        if self.state == DisplayState::ShowingError {
            self.surface.dismiss();
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::work::{Failure, ProgressEvent};
    use core::fmt::{Display, Formatter};
    use core::time::Duration;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Open(String),
        Update(ProgressEvent),
        Close,
        ShowFailure(Failure),
        Dismiss,
    }

    #[derive(Debug, Clone, Default)]
    struct RecordingSurface {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl RecordingSurface {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Surface for RecordingSurface {
        fn open(&mut self, title: &str) {
            self.calls.lock().unwrap().push(Call::Open(title.to_string()));
        }

        fn update(&mut self, event: &ProgressEvent) {
            self.calls.lock().unwrap().push(Call::Update(*event));
        }

        fn close(&mut self) {
            self.calls.lock().unwrap().push(Call::Close);
        }

        fn show_failure(&mut self, failure: &Failure) {
            self.calls.lock().unwrap().push(Call::ShowFailure(failure.clone()));
        }

        fn dismiss(&mut self) {
            self.calls.lock().unwrap().push(Call::Dismiss);
        }
    }

    #[derive(Debug)]
    struct ValueError(&'static str);

    impl Display for ValueError {
        fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
            f.write_str(self.0)
        }
    }

    #[tokio::test]
    async fn test_success_closes_the_window() {
        let surface = RecordingSurface::default();
        let mut display = ProgressDisplay::new(surface.clone());
        assert_eq!(display.state(), DisplayState::Idle);

        let spec = WorkSpec::infallible("answer", Duration::from_secs(1), || {
            std::thread::sleep(Duration::from_millis(100));
            42
        })
        .unwrap();
        let outcome = display.show(spec, &Worker::default()).await.unwrap();

        assert_eq!(outcome, OutcomeEvent::Success(42));
        assert_eq!(display.state(), DisplayState::Closed);

        let calls = surface.calls();
        assert_eq!(calls.first(), Some(&Call::Open("answer Progress Bar".to_string())));
        assert_eq!(calls.last(), Some(&Call::Close));
        assert!(calls.iter().any(|c| matches!(c, Call::Update(_))), "expected progress updates");
        assert!(!calls.iter().any(|c| matches!(c, Call::ShowFailure(_))));
    }

    #[tokio::test]
    async fn test_failure_keeps_the_window_open() {
        let surface = RecordingSurface::default();
        let mut display = ProgressDisplay::new(surface.clone());

        let spec = WorkSpec::new("bad", Duration::from_secs(1), || Err::<u32, _>(ValueError("bad"))).unwrap();
        let outcome = display.show(spec, &Worker::default()).await.unwrap();

        let failure = outcome.failure().expect("expected a failure");
        assert_eq!(failure.error_kind, "ValueError");
        assert_eq!(failure.message, "bad");
        assert_eq!(display.state(), DisplayState::ShowingError);
        assert!(display.state().is_terminal());

        let calls = surface.calls();
        assert_eq!(calls.last(), Some(&Call::ShowFailure(failure.clone())));
        assert!(!calls.contains(&Call::Close));

        display.dismiss();
        assert_eq!(surface.calls().last(), Some(&Call::Dismiss));
    }

    #[tokio::test]
    async fn test_display_cannot_be_reused() {
        let mut display = ProgressDisplay::new(RecordingSurface::default());
        let worker = Worker::default();

        let first = WorkSpec::infallible("first", Duration::from_millis(50), || 1).unwrap();
        let _ = display.show(first, &worker).await.unwrap();

        let second = WorkSpec::infallible("second", Duration::from_millis(50), || 2).unwrap();
        let result = display.show(second, &worker).await;
        assert!(result.is_err());
        assert_eq!(display.state(), DisplayState::Closed);
    }

    #[tokio::test]
    async fn test_progress_updates_are_monotonic() {
        let surface = RecordingSurface::default();
        let mut display = ProgressDisplay::new(surface.clone());
        let worker = Worker::default().with_refresh_interval(Duration::from_millis(10));

        let spec = WorkSpec::infallible("sleepy", Duration::from_millis(200), || {
            std::thread::sleep(Duration::from_millis(150));
        })
        .unwrap();
        let _ = display.show(spec, &worker).await.unwrap();

        let fractions: Vec<f64> = surface
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Update(e) => Some(e.fraction_complete),
                _ => None,
            })
            .collect();
        assert!(fractions.len() >= 2);
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
        assert!((fractions.last().copied().unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_concurrent_displays_show_only_their_own_run() {
        let worker = Worker::default();
        let surface_a = RecordingSurface::default();
        let surface_b = RecordingSurface::default();
        let mut display_a = ProgressDisplay::new(surface_a.clone());
        let mut display_b = ProgressDisplay::new(surface_b.clone());

        let spec_a = WorkSpec::infallible("a", Duration::from_secs(1), || {
            std::thread::sleep(Duration::from_millis(60));
            "a"
        })
        .unwrap();
        let spec_b = WorkSpec::infallible("b", Duration::from_secs(9), || {
            std::thread::sleep(Duration::from_millis(30));
            "b"
        })
        .unwrap();

        let (a, b) = tokio::join!(display_a.show(spec_a, &worker), display_b.show(spec_b, &worker));
        assert_eq!(a.unwrap(), OutcomeEvent::Success("a"));
        assert_eq!(b.unwrap(), OutcomeEvent::Success("b"));

        assert_eq!(surface_a.calls().first(), Some(&Call::Open("a Progress Bar".to_string())));
        assert_eq!(surface_b.calls().first(), Some(&Call::Open("b Progress Bar".to_string())));

        let first_update = |calls: Vec<Call>| {
            calls.into_iter().find_map(|c| match c {
                Call::Update(e) => Some(e.estimated_remaining),
                _ => None,
            })
        };
        assert!(first_update(surface_a.calls()).unwrap() <= Duration::from_secs(1));
        assert!(first_update(surface_b.calls()).unwrap() > Duration::from_secs(8));
    }
}
