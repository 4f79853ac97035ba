//! Coalesces bursts of adjustment edits into a single delayed action.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

/// Quiet period before a scheduled regeneration actually runs.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(800);

/// Cancellable delayed task.
///
/// Each `schedule` replaces any previously scheduled action: the old delayed
/// task wakes, sees its generation is stale, and does nothing. Only the last
/// action of a burst survives the quiet period.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet_period: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Schedule `action` to run after the quiet period, cancelling whatever
    /// was scheduled before.
    pub fn schedule<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let quiet_period = self.quiet_period;

        thread::spawn(move || {
            thread::sleep(quiet_period);
            if generation.load(Ordering::SeqCst) == ticket {
                action();
            }
        });
    }

    /// Drop any pending action without scheduling a new one.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}
