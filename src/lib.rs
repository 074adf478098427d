//! # Spectral Logger
//!
//! Colorful console logging with ordered, buffered delivery to stdout and stderr.
//!
//! ## Features
//!
//! - **Ordered output**: one worker per sink; lines reach a sink in call order
//! - **Adaptive buffering**: flushes at a high-water mark or after a delay that shrinks as
//!   the buffer fills
//! - **Error deduplication**: repeated errors are counted instead of lost
//! - **Plugins**: before/after hooks that can rewrite or observe every message
//! - **Fail-open**: plugin and sink failures go to a diagnostic handler, never to the caller
//!
//! ```
//! use spectral_logger::prelude::*;
//! use spectral_logger::sinks::MemorySink;
//!
//! let stderr = MemorySink::new("stderr");
//! let logger = Logger::builder()
//!     .normal_sink(MemorySink::new("stdout"))
//!     .elevated_sink(stderr.clone())
//!     .color_support(ColorSupport::None)
//!     .build()
//!     .unwrap();
//!
//! logger.child("db").warn("slow query");
//! logger.flush_blocking().unwrap();
//! assert!(stderr.contents().contains("[db] slow query"));
//! ```

pub mod core;
pub mod macros;
pub mod plugins;
pub mod sinks;

pub use core::diagnostics;

pub mod prelude {
    pub use crate::core::{
        Codec, ColorSupport, Config, ConfigOptions, ErrorReport, LogLevel, LogOptions, LogRecord,
        Logger, LoggerBuilder, LoggerError, Payload, Plugin, QueueOptions, Result, SinkKind,
        TimeFormat, DEFAULT_SHUTDOWN_TIMEOUT,
    };
}

pub use core::{
    Codec, ColorResolver, ColorSupport, Config, ConfigOptions, ConsoleLine, DiagnosticHandler,
    ErrorCacheEntry, ErrorDeduplicator, ErrorReport, LogLevel, LogOptions, LogRecord, Logger,
    LoggerBuilder, LoggerError, OutputMetrics, OutputQueue, Payload, Plugin, PluginPipeline,
    QueueOptions, Result, SharedConfig, Sink, SinkKind, TimeFormat, DEFAULT_SHUTDOWN_TIMEOUT,
};
