//! Progress reporting and cooperative cancellation.

use crate::error::{Error, Result};
use log::info;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Throttled "n% done" logger shared by all workers of one phase.
///
/// Workers report finished units with [`ProgressLogger::log_progress`]; at
/// most one line is emitted per interval, from whichever worker crosses it.
#[derive(Debug)]
pub struct ProgressLogger {
    task: &'static str,
    total: AtomicUsize,
    done: AtomicUsize,
    interval: Duration,
    start: Instant,
    // milliseconds since `start`
    last_log: AtomicU64,
}

impl ProgressLogger {
    /// Default time between two progress lines.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

    /// Logger for `total` units of `task`.
    pub fn new(task: &'static str, total: usize) -> Self {
        Self {
            task,
            total: AtomicUsize::new(total),
            done: AtomicUsize::new(0),
            interval: Self::DEFAULT_INTERVAL,
            start: Instant::now(),
            last_log: AtomicU64::new(0),
        }
    }

    /// Set the time between two progress lines.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Start over with `total` units.
    pub fn reset(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
    }

    /// Fraction of units reported so far, in `[0, 1]`.
    pub fn fraction_done(&self) -> f64 {
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            return 1.0;
        }
        (self.done.load(Ordering::Relaxed) as f64 / total as f64).min(1.0)
    }

    /// Report `units` finished units. Returns whether a line was logged.
    pub fn log_progress(&self, units: usize) -> bool {
        let _ = self.done.fetch_add(units, Ordering::Relaxed);

        let now = self.start.elapsed().as_millis() as u64;
        let last = self.last_log.load(Ordering::Relaxed);
        let interval = self.interval.as_millis() as u64;
        if now < last.saturating_add(interval) {
            return false;
        }
        if self
            .last_log
            .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }

        let thread = std::thread::current();
        info!(
            "[{}] {} {:.0}% done",
            thread.name().unwrap_or("unnamed"),
            self.task,
            self.fraction_done() * 100.0
        );
        true
    }
}

/// Shared flag used to ask a running computation to stop.
///
/// Clones observe the same flag. The optimizer polls it between color
/// phases; a phase already running always completes.
#[derive(Debug, Clone, Default)]
pub struct TerminationFlag {
    terminated: Arc<AtomicBool>,
}

impl TerminationFlag {
    /// A flag in the running state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request termination.
    pub fn terminate(&self) {
        self.terminated.store(true, Ordering::Release);
    }

    /// Whether termination has not been requested.
    pub fn running(&self) -> bool {
        !self.terminated.load(Ordering::Acquire)
    }

    /// `Err(Error::Cancelled)` once termination was requested.
    pub fn assert_running(&self) -> Result<()> {
        if self.running() {
            Ok(())
        } else {
            Err(Error::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_fraction() {
        let progress = ProgressLogger::new("test", 4).with_interval(Duration::from_secs(3600));
        let _ = progress.log_progress(1);
        assert_eq!(progress.fraction_done(), 0.25);
        let _ = progress.log_progress(10);
        assert_eq!(progress.fraction_done(), 1.0);

        progress.reset(0);
        assert_eq!(progress.fraction_done(), 1.0);
    }

    #[test]
    fn test_progress_throttled() {
        let progress = ProgressLogger::new("test", 100).with_interval(Duration::from_secs(3600));
        // The first report is only due after one full interval.
        assert!(!progress.log_progress(1));
        assert!(!progress.log_progress(1));

        let eager = ProgressLogger::new("test", 100).with_interval(Duration::ZERO);
        assert!(eager.log_progress(1));
    }

    #[test]
    fn test_termination_flag_shared_between_clones() {
        let flag = TerminationFlag::new();
        let clone = flag.clone();
        assert!(flag.running());
        assert!(clone.assert_running().is_ok());

        clone.terminate();
        assert!(!flag.running());
        assert_eq!(flag.assert_running(), Err(Error::Cancelled));
    }
}
