use core::time::Duration;

/// A periodic report of how far a run has progressed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    /// Fraction of the predicted work completed, in `[0, 1]`.
    pub fraction_complete: f64,

    /// Predicted time until the run completes.
    pub estimated_remaining: Duration,
}

impl ProgressEvent {
    #[must_use]
    pub fn new(fraction_complete: f64, estimated_remaining: Duration) -> Self {
        Self {
            fraction_complete: fraction_complete.clamp(0.0, 1.0),
            estimated_remaining,
        }
    }

    /// The event reported right before a successful outcome.
    #[must_use]
    pub fn complete() -> Self {
        Self::new(1.0, Duration::ZERO)
    }

    #[must_use]
    pub fn estimated_seconds_remaining(&self) -> f64 {
        self.estimated_remaining.as_secs_f64()
    }

    /// Completion as a whole percentage, suitable for a bar of length 100.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "fraction is clamped to [0, 1] on construction"
    )]
    pub fn percent(&self) -> u64 {
        (self.fraction_complete * 100.0).round() as u64
    }
}
