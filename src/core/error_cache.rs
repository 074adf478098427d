//! Error deduplication
//!
//! Repeated errors with the same kind and message share one cache entry. Every sighting is
//! still rendered in full; only the occurrence counter grows. The cache is bounded and evicts
//! the entry that was first seen earliest (not least recently used).

use super::formatter::Formatter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Default number of distinct error signatures kept
pub const DEFAULT_ERROR_CACHE_CAPACITY: usize = 100;

/// Path fragments marking frames that belong to dependencies or the toolchain
const VENDOR_MARKERS: [&str; 5] = [
    "/.cargo/registry/",
    "/.cargo/git/",
    "/rustc/",
    "/vendor/",
    "node_modules",
];

/// A loggable error: kind, message and an optional stack
///
/// The stack, when present, starts with a header line (`Kind: message`) followed by one
/// frame per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
    pub stack: Option<String>,
}

impl ErrorReport {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            stack: None,
        }
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Build a report from any error; the `source()` chain becomes the stack frames
    pub fn from_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
        let kind = short_type_name(std::any::type_name::<E>());
        let mut report = Self::new(kind, error.to_string());

        let mut frames = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            frames.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        if !frames.is_empty() {
            report.stack = Some(format!("{}\n{}", report.header(), frames.join("\n")));
        }
        report
    }

    /// Attach a captured backtrace as the stack
    #[must_use]
    pub fn with_backtrace(mut self, backtrace: &std::backtrace::Backtrace) -> Self {
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            self.stack = Some(format!("{}\n{}", self.header(), backtrace));
        }
        self
    }

    /// `Kind: message`
    pub fn header(&self) -> String {
        format!("{}: {}", self.kind, self.message)
    }

    pub fn key(&self) -> ErrorKey {
        ErrorKey {
            kind: self.kind.clone(),
            message: self.message.clone(),
        }
    }

    /// Stack without its header line and without dependency frames
    pub fn clean_stack(&self) -> Option<String> {
        let stack = self.stack.as_deref()?;
        let frames: Vec<&str> = stack
            .lines()
            .skip(1)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| !VENDOR_MARKERS.iter().any(|marker| line.contains(marker)))
            .collect();
        Some(frames.join("\n  "))
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header())
    }
}

fn short_type_name(full: &str) -> String {
    if full.starts_with("dyn ") {
        return "Error".to_string();
    }
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .to_string()
}

/// Signature an error is deduplicated by
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ErrorKey {
    pub kind: String,
    pub message: String,
}

impl fmt::Display for ErrorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorCacheEntry {
    pub error: ErrorReport,
    pub count: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    #[serde(skip)]
    sequence: u64,
}

/// Bounded cache of recently seen error signatures
#[derive(Debug)]
pub struct ErrorDeduplicator {
    entries: HashMap<ErrorKey, ErrorCacheEntry>,
    capacity: usize,
    next_sequence: u64,
}

impl ErrorDeduplicator {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ERROR_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            next_sequence: 0,
        }
    }

    /// Record one sighting and return how many times the signature has been seen
    pub fn record(&mut self, report: &ErrorReport) -> u64 {
        let key = report.key();
        let now = Utc::now();

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.count += 1;
            entry.last_seen = now;
            return entry.count;
        }

        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            ErrorCacheEntry {
                error: report.clone(),
                count: 1,
                first_seen: now,
                last_seen: now,
                sequence: self.next_sequence,
            },
        );
        self.next_sequence += 1;
        1
    }

    /// Record the error and render it, annotated with the count once it repeats
    pub fn handle(&mut self, report: &ErrorReport, formatter: &mut Formatter<'_>) -> String {
        let count = self.record(report);
        let rendered = formatter.format_error(report);
        if count > 1 {
            format!("{}\n(This error occurred {} times)", rendered, count)
        } else {
            rendered
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.sequence)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }

    pub fn get(&self, kind: &str, message: &str) -> Option<&ErrorCacheEntry> {
        self.entries.get(&ErrorKey {
            kind: kind.to_string(),
            message: message.to_string(),
        })
    }

    /// Copy of every entry, oldest first sighting first
    pub fn snapshot(&self) -> Vec<ErrorCacheEntry> {
        let mut entries: Vec<ErrorCacheEntry> = self.entries.values().cloned().collect();
        entries.sort_by_key(|entry| entry.sequence);
        entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ErrorDeduplicator {
    fn default() -> Self {
        Self::new()
    }
}
