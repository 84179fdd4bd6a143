//! Timing helpers for the kernel phases
//!
//! RAII scopes log their elapsed time through `tracing` when dropped.
use std::time::Instant;
use tracing::debug;

/// A profiling scope that measures elapsed time using RAII.
///
/// The elapsed time is logged at `debug` level when the scope is dropped.
pub struct ProfilerScope {
    start: Instant,
    name: &'static str,
}

impl ProfilerScope {
    /// Start timing the phase `name`
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    /// Elapsed time in milliseconds
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ProfilerScope {
    fn drop(&mut self) {
        debug!(phase = self.name, elapsed_ms = self.elapsed_ms(), "phase finished");
    }
}

/// Timer for repeated kernel calls
///
/// Keeps the duration of the last call plus running totals for a benchmark
/// report.
#[derive(Debug, Clone, Default)]
pub struct FrameTimer {
    last_ms: f64,
    total_ms: f64,
    calls: usize,
}

impl FrameTimer {
    /// Create an empty timer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call lasting `time_ms` milliseconds
    pub fn record(&mut self, time_ms: f64) {
        self.last_ms = time_ms;
        self.total_ms += time_ms;
        self.calls += 1;
    }

    /// Duration of the last recorded call
    #[must_use]
    pub fn last_ms(&self) -> f64 {
        self.last_ms
    }

    /// Sum of all recorded durations
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ms
    }

    /// Number of recorded calls
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Mean duration, zero before the first call
    #[must_use]
    pub fn mean_ms(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.total_ms / self.calls as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_profiler_scope_measures_time() {
        let scope = ProfilerScope::new("test");
        thread::sleep(Duration::from_millis(10));
        let elapsed = scope.elapsed_ms();
        assert!(elapsed >= 10.0, "Expected at least 10ms, got {elapsed}");
    }

    #[test]
    fn test_frame_timer() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.last_ms(), 0.0);
        assert_eq!(timer.mean_ms(), 0.0);

        timer.record(16.0);
        timer.record(8.0);
        assert_eq!(timer.last_ms(), 8.0);
        assert_eq!(timer.total_ms(), 24.0);
        assert_eq!(timer.calls(), 2);
        assert_eq!(timer.mean_ms(), 12.0);
    }
}
