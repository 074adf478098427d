//! Bundled plugins

pub mod performance;

pub use performance::{PerformanceStats, PerformanceTracker};

pub use crate::core::Plugin;
