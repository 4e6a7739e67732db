use super::ProgressEvent;
use core::time::Duration;

/// The highest fraction reported while the function is still running.
const MAX_RUNNING_FRACTION: f64 = 0.99;

/// Shortest tick period, regardless of how short the prediction is.
const MIN_TICK: Duration = Duration::from_millis(10);

/// Turns elapsed time into progress events by counting down from a predicted duration.
///
/// The fraction grows linearly with elapsed time and stops at 99% until the run
/// actually finishes. The remaining time counts down and stays at `min_remaining`
/// once the prediction has been overrun.
#[derive(Debug, Clone)]
pub struct ProgressClock {
    predicted: Duration,
    min_remaining: Duration,
    high_water: f64,
}

impl ProgressClock {
    #[must_use]
    pub const fn new(predicted: Duration, min_remaining: Duration) -> Self {
        Self {
            predicted,
            min_remaining,
            high_water: 0.0,
        }
    }

    /// Produce the progress event for `elapsed` time since the run started.
    pub fn sample(&mut self, elapsed: Duration) -> ProgressEvent {
        let fraction = if self.predicted.is_zero() {
            MAX_RUNNING_FRACTION
        } else {
            (elapsed.as_secs_f64() / self.predicted.as_secs_f64()).min(MAX_RUNNING_FRACTION)
        };
        self.high_water = self.high_water.max(fraction);

        let remaining = self.predicted.saturating_sub(elapsed).max(self.min_remaining);
        ProgressEvent::new(self.high_water, remaining)
    }

    /// How often to sample: one percent of the prediction, within `[10ms, max]`.
    #[must_use]
    pub fn tick_interval(&self, max: Duration) -> Duration {
        (self.predicted / 100).clamp(MIN_TICK, max.max(MIN_TICK))
    }

    #[must_use]
    pub const fn predicted(&self) -> Duration {
        self.predicted
    }
}
