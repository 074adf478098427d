//! Output metrics for observability
//!
//! One [`OutputMetrics`] exists per sink. Counters are updated by the logging threads (enqueue)
//! and by the sink's worker (writes and flushes).

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one sink
///
/// # Example
///
/// ```
/// use spectral_logger::OutputMetrics;
///
/// let metrics = OutputMetrics::new();
/// metrics.record_enqueued();
/// metrics.record_written(1);
///
/// assert_eq!(metrics.lines_enqueued(), 1);
/// assert_eq!(metrics.pending(), 0);
/// ```
#[derive(Debug)]
pub struct OutputMetrics {
    /// Lines accepted by the queue
    lines_enqueued: AtomicU64,

    /// Lines fully accepted by the sink
    lines_written: AtomicU64,

    /// Chunks dropped because the sink failed
    write_failures: AtomicU64,

    /// Lines inside those dropped chunks
    lines_dropped: AtomicU64,

    /// Flushes triggered by reaching the high-water mark
    immediate_flushes: AtomicU64,

    /// Flushes fired by the adaptive timer
    scheduled_flushes: AtomicU64,

    /// Flushes requested by callers
    forced_flushes: AtomicU64,

    /// Times the sink pushed back (would block or accepted a partial write)
    backpressure_waits: AtomicU64,
}

impl OutputMetrics {
    pub const fn new() -> Self {
        Self {
            lines_enqueued: AtomicU64::new(0),
            lines_written: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            lines_dropped: AtomicU64::new(0),
            immediate_flushes: AtomicU64::new(0),
            scheduled_flushes: AtomicU64::new(0),
            forced_flushes: AtomicU64::new(0),
            backpressure_waits: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn lines_enqueued(&self) -> u64 {
        self.lines_enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn lines_written(&self) -> u64 {
        self.lines_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn lines_dropped(&self) -> u64 {
        self.lines_dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn immediate_flushes(&self) -> u64 {
        self.immediate_flushes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn scheduled_flushes(&self) -> u64 {
        self.scheduled_flushes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn forced_flushes(&self) -> u64 {
        self.forced_flushes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn backpressure_waits(&self) -> u64 {
        self.backpressure_waits.load(Ordering::Relaxed)
    }

    /// Record a line entering the queue; returns the previous count
    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.lines_enqueued.fetch_add(1, Ordering::Relaxed)
    }

    /// Record `lines` delivered in one write
    #[inline]
    pub fn record_written(&self, lines: u64) -> u64 {
        self.lines_written.fetch_add(lines, Ordering::Relaxed)
    }

    /// Record one failed write that dropped `lines`; returns the previous failure count
    #[inline]
    pub fn record_failure(&self, lines: u64) -> u64 {
        self.lines_dropped.fetch_add(lines, Ordering::Relaxed);
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_immediate_flush(&self) -> u64 {
        self.immediate_flushes.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_scheduled_flush(&self) -> u64 {
        self.scheduled_flushes.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_forced_flush(&self) -> u64 {
        self.forced_flushes.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_backpressure(&self) -> u64 {
        self.backpressure_waits.fetch_add(1, Ordering::Relaxed)
    }

    /// Lines enqueued but not yet written or dropped
    ///
    /// Approximate while the worker is running; exact once the queue has drained.
    pub fn pending(&self) -> u64 {
        self.lines_enqueued()
            .saturating_sub(self.lines_written())
            .saturating_sub(self.lines_dropped())
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.lines_enqueued.store(0, Ordering::Relaxed);
        self.lines_written.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
        self.lines_dropped.store(0, Ordering::Relaxed);
        self.immediate_flushes.store(0, Ordering::Relaxed);
        self.scheduled_flushes.store(0, Ordering::Relaxed);
        self.forced_flushes.store(0, Ordering::Relaxed);
        self.backpressure_waits.store(0, Ordering::Relaxed);
    }
}

impl Default for OutputMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for OutputMetrics {
    /// Snapshot of the current values
    fn clone(&self) -> Self {
        Self {
            lines_enqueued: AtomicU64::new(self.lines_enqueued()),
            lines_written: AtomicU64::new(self.lines_written()),
            write_failures: AtomicU64::new(self.write_failures()),
            lines_dropped: AtomicU64::new(self.lines_dropped()),
            immediate_flushes: AtomicU64::new(self.immediate_flushes()),
            scheduled_flushes: AtomicU64::new(self.scheduled_flushes()),
            forced_flushes: AtomicU64::new(self.forced_flushes()),
            backpressure_waits: AtomicU64::new(self.backpressure_waits()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = OutputMetrics::new();
        assert_eq!(metrics.lines_enqueued(), 0);
        assert_eq!(metrics.lines_written(), 0);
        assert_eq!(metrics.write_failures(), 0);
        assert_eq!(metrics.backpressure_waits(), 0);
    }

    #[test]
    fn test_record_returns_previous() {
        let metrics = OutputMetrics::new();
        assert_eq!(metrics.record_enqueued(), 0);
        assert_eq!(metrics.record_enqueued(), 1);
        assert_eq!(metrics.record_written(2), 0);
        assert_eq!(metrics.lines_written(), 2);
    }

    #[test]
    fn test_pending() {
        let metrics = OutputMetrics::new();
        for _ in 0..5 {
            metrics.record_enqueued();
        }
        metrics.record_written(3);
        assert_eq!(metrics.pending(), 2);
    }

    #[test]
    fn test_dropped_lines_are_not_pending() {
        let metrics = OutputMetrics::new();
        for _ in 0..5 {
            metrics.record_enqueued();
        }
        metrics.record_failure(4);
        metrics.record_written(1);

        assert_eq!(metrics.write_failures(), 1);
        assert_eq!(metrics.lines_dropped(), 4);
        assert_eq!(metrics.pending(), 0);
    }

    #[test]
    fn test_reset_and_snapshot() {
        let metrics = OutputMetrics::new();
        metrics.record_forced_flush();
        metrics.record_failure(2);

        let snapshot = metrics.clone();
        metrics.reset();

        assert_eq!(metrics.forced_flushes(), 0);
        assert_eq!(snapshot.forced_flushes(), 1);
        assert_eq!(snapshot.write_failures(), 1);
        assert_eq!(snapshot.lines_dropped(), 2);
        assert_eq!(metrics.lines_dropped(), 0);
    }
}
