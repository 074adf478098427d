//! Logging macros for ergonomic log message formatting.
//!
//! These macros format their arguments like `format!` and pass the result to the logger.
//!
//! # Examples
//!
//! ```
//! use spectral_logger::prelude::*;
//! use spectral_logger::sinks::MemorySink;
//! use spectral_logger::info;
//!
//! let stdout = MemorySink::new("stdout");
//! let logger = Logger::builder()
//!     .normal_sink(stdout.clone())
//!     .elevated_sink(MemorySink::new("stderr"))
//!     .build()
//!     .unwrap();
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! logger.flush_blocking().unwrap();
//! assert!(stdout.contents().contains("port 8080"));
//! ```

/// Log a formatted message at any level.
///
/// ```
/// # use spectral_logger::prelude::*;
/// # use spectral_logger::sinks::MemorySink;
/// # let logger = Logger::builder().normal_sink(MemorySink::default()).elevated_sink(MemorySink::default()).build().unwrap();
/// use spectral_logger::log;
/// log!(logger, LogLevel::Log, "Plain message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.emit($level, format!($($arg)+), $crate::LogOptions::default())
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a success-level message.
#[macro_export]
macro_rules! success {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Success, $($arg)+)
    };
}

/// Log a warning. Goes to the elevated sink.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error message. Goes to the elevated sink.
///
/// Formats to text; pass an [`ErrorReport`](crate::ErrorReport) to `Logger::error` directly to
/// get deduplication and stack output.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a debug-level message. Dropped unless debug mode is on.
///
/// ```
/// # use spectral_logger::prelude::*;
/// # use spectral_logger::sinks::MemorySink;
/// # let logger = Logger::builder().normal_sink(MemorySink::default()).elevated_sink(MemorySink::default()).build().unwrap();
/// use spectral_logger::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}
