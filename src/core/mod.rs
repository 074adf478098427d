//! Core logger types and traits

pub mod codec;
pub mod color;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod error_cache;
pub mod formatter;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod output_queue;
pub mod plugin;
pub mod sink;
pub mod timestamp;

pub use codec::Codec;
pub use color::{paint_with, ColorEnv, ColorResolver, ColorSupport, Rgb, RESET};
pub use config::{Config, ConfigOptions, LevelColors, SharedConfig};
pub use diagnostics::DiagnosticHandler;
pub use error::{LoggerError, Result};
pub use error_cache::{ErrorCacheEntry, ErrorDeduplicator, ErrorKey, ErrorReport};
pub use formatter::{markup, parse_markers, ConsoleLine, Formatter, Segment};
pub use log_level::{LogLevel, SinkKind};
pub use log_record::{LogOptions, LogRecord, Payload};
pub use logger::{Logger, LoggerBuilder, DEFAULT_SHUTDOWN_TIMEOUT};
pub use metrics::OutputMetrics;
pub use output_queue::{adaptive_delay, safe_write, BufferedChunk, OutputQueue, QueueOptions};
pub use plugin::{Plugin, PluginPipeline};
pub use sink::Sink;
pub use timestamp::{short_timestamp, short_timestamp_now, TimeFormat};
