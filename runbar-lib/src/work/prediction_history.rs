use core::time::Duration;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Log target for the prediction history
const LOG_TARGET: &str = "   history";

/// Number of durations remembered per key unless configured otherwise.
pub const DEFAULT_HISTORY_LEN: usize = 3;

/// Remembers how long recent runs of each function took.
///
/// The prediction for a key is the mean of its most recent durations. Cloning
/// shares the underlying record, so concurrent runs of the same function all
/// contribute to and benefit from it.
#[derive(Debug, Clone)]
pub struct PredictionHistory {
    durations: Arc<Mutex<HashMap<String, VecDeque<Duration>>>>,
    capacity: usize,
}

impl PredictionHistory {
    /// Create a history that remembers up to `capacity` durations per key (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            durations: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Record `estimate` for `key` unless the key already has history.
    pub fn seed(&self, key: &str, estimate: Duration) {
        let mut durations = self.durations.lock().expect("lock poisoned");
        if !durations.contains_key(key) {
            log::debug!(target: LOG_TARGET, "Seeding '{key}' with {:.3}s", estimate.as_secs_f64());
            let _ = durations.insert(key.to_string(), VecDeque::from([estimate]));
        }
    }

    /// Record an actual duration, forgetting the oldest one once the key is at capacity.
    pub fn record(&self, key: &str, elapsed: Duration) {
        let mut durations = self.durations.lock().expect("lock poisoned");
        let queue = durations.entry(key.to_string()).or_default();
        while queue.len() >= self.capacity {
            let _ = queue.pop_front();
        }
        queue.push_back(elapsed);
        log::debug!(target: LOG_TARGET, "Recorded {:.3}s for '{key}'", elapsed.as_secs_f64());
    }

    /// The mean of the remembered durations for `key`, if any.
    #[must_use]
    pub fn predict(&self, key: &str) -> Option<Duration> {
        let durations = self.durations.lock().expect("lock poisoned");
        let queue = durations.get(key).filter(|q| !q.is_empty())?;
        let total: Duration = queue.iter().sum();
        let count = u32::try_from(queue.len()).unwrap_or(u32::MAX);
        Some(total / count)
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for PredictionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}
