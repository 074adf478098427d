//! Per-level log counts and per-call pipeline timing

use crate::core::{LogLevel, LogRecord, Plugin, Result};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::thread::ThreadId;
use std::time::{Duration, Instant};

/// Snapshot returned by [`PerformanceTracker::stats`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub total_logs: u64,
    pub logs_by_level: HashMap<LogLevel, u64>,
    /// Time spent between the before and after hooks, summed over all calls
    #[serde(with = "duration_micros")]
    pub total_time: Duration,
    #[serde(with = "duration_micros")]
    pub average_time: Duration,
}

impl PerformanceStats {
    pub fn count(&self, level: LogLevel) -> u64 {
        self.logs_by_level.get(&level).copied().unwrap_or(0)
    }
}

mod duration_micros {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_micros()).unwrap_or(u64::MAX))
    }
}

/// Counts logs per level and measures how long each call spends between its hooks
///
/// Measurements are kept per thread, so concurrent calls from different threads do not
/// overwrite each other's start time.
///
/// ```
/// use spectral_logger::plugins::PerformanceTracker;
/// use spectral_logger::prelude::*;
/// use spectral_logger::sinks::MemorySink;
/// use std::sync::Arc;
///
/// let tracker = Arc::new(PerformanceTracker::new());
/// let logger = Logger::builder()
///     .normal_sink(MemorySink::default())
///     .elevated_sink(MemorySink::default())
///     .build()
///     .unwrap();
/// logger.use_plugin(tracker.clone());
///
/// logger.info("one");
/// logger.info("two");
/// assert_eq!(tracker.stats().count(LogLevel::Info), 2);
/// ```
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    stats: Mutex<PerformanceStats>,
    started: Mutex<HashMap<ThreadId, Instant>>,
}

impl PerformanceTracker {
    pub const NAME: &'static str = "PerformanceTracker";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> PerformanceStats {
        self.stats.lock().clone()
    }

    pub fn reset(&self) {
        *self.stats.lock() = PerformanceStats::default();
        self.started.lock().clear();
    }

    /// Human-readable summary table
    pub fn report(&self) -> String {
        let stats = self.stats();
        let mut out = String::from("=== Performance Statistics ===\n");
        let _ = writeln!(out, "Total Logs: {}", stats.total_logs);
        let _ = writeln!(out, "Total Time: {:.2}ms", stats.total_time.as_secs_f64() * 1000.0);
        let _ = writeln!(
            out,
            "Average Time: {:.4}ms per log",
            stats.average_time.as_secs_f64() * 1000.0
        );
        out.push_str("Logs by Level:\n");
        for level in LogLevel::ALL {
            let count = stats.count(level);
            if count > 0 {
                let _ = writeln!(out, "  {}: {}", level, count);
            }
        }
        out
    }
}

impl Plugin for PerformanceTracker {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn before_log(&self, _message: &str, _record: &LogRecord<'_>) -> Result<Option<String>> {
        self.started
            .lock()
            .insert(std::thread::current().id(), Instant::now());
        Ok(None)
    }

    fn after_log(&self, _message: &str, record: &LogRecord<'_>) -> Result<()> {
        let Some(start) = self.started.lock().remove(&std::thread::current().id()) else {
            return Ok(());
        };
        let elapsed = start.elapsed();

        let mut stats = self.stats.lock();
        stats.total_logs += 1;
        *stats.logs_by_level.entry(record.level).or_insert(0) += 1;
        stats.total_time += elapsed;
        stats.average_time = stats.total_time / u32::try_from(stats.total_logs).unwrap_or(u32::MAX);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogOptions, Payload};

    fn call(tracker: &PerformanceTracker, level: LogLevel) {
        let payload = Payload::from("m");
        let options = LogOptions::new();
        let record = LogRecord::new(level, &payload, &options, None);
        tracker.before_log("m", &record).unwrap();
        tracker.after_log("m", &record).unwrap();
    }

    #[test]
    fn test_counts_per_level() {
        let tracker = PerformanceTracker::new();
        call(&tracker, LogLevel::Info);
        call(&tracker, LogLevel::Info);
        call(&tracker, LogLevel::Error);

        let stats = tracker.stats();
        assert_eq!(stats.total_logs, 3);
        assert_eq!(stats.count(LogLevel::Info), 2);
        assert_eq!(stats.count(LogLevel::Error), 1);
        assert_eq!(stats.count(LogLevel::Debug), 0);
        assert!(stats.average_time <= stats.total_time);
    }

    #[test]
    fn test_after_without_before_is_ignored() {
        let tracker = PerformanceTracker::new();
        let payload = Payload::from("m");
        let options = LogOptions::new();
        let record = LogRecord::new(LogLevel::Log, &payload, &options, None);
        tracker.after_log("m", &record).unwrap();
        assert_eq!(tracker.stats().total_logs, 0);
    }

    #[test]
    fn test_reset_and_report() {
        let tracker = PerformanceTracker::new();
        call(&tracker, LogLevel::Warn);

        let report = tracker.report();
        assert!(report.contains("Total Logs: 1"));
        assert!(report.contains("  warn: 1"));
        assert!(!report.contains("info:"));

        tracker.reset();
        assert_eq!(tracker.stats(), PerformanceStats::default());
    }

    #[test]
    fn test_stats_serialize() {
        let tracker = PerformanceTracker::new();
        call(&tracker, LogLevel::Success);
        let json = serde_json::to_value(tracker.stats()).unwrap();
        assert_eq!(json["total_logs"], 1);
        assert_eq!(json["logs_by_level"]["success"], 1);
        assert!(json["total_time"].is_u64());
    }
}
