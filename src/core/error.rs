//! Error types for the logger system

use std::time::Duration;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// A plugin hook returned an error or panicked
    #[error("Plugin '{plugin}' failed in {hook}: {message}")]
    PluginError {
        plugin: String,
        hook: &'static str,
        message: String,
    },

    /// Writing a chunk to one of the sinks failed
    #[error("Write to {sink} sink failed: {source}")]
    SinkWrite {
        sink: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Flush did not complete within the allowed time
    #[error("Flush did not complete within {timeout:?}")]
    FlushTimeout { timeout: Duration },

    /// Output worker thread panicked
    #[error("Output worker for {sink} sink panicked: {message}")]
    WorkerPanic { sink: &'static str, message: String },

    /// Logger already stopped
    #[error("Logger already stopped")]
    LoggerStopped,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a plugin hook error
    pub fn plugin(plugin: impl Into<String>, hook: &'static str, message: impl Into<String>) -> Self {
        LoggerError::PluginError {
            plugin: plugin.into(),
            hook,
            message: message.into(),
        }
    }

    /// Create a sink write error
    pub fn sink_write(sink: &'static str, source: std::io::Error) -> Self {
        LoggerError::SinkWrite { sink, source }
    }

    /// Create a worker panic error
    pub fn worker_panic(sink: &'static str, message: impl Into<String>) -> Self {
        LoggerError::WorkerPanic {
            sink,
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}

/// Extract a readable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::config("colors.info", "unrecognized color");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::plugin("upper", "before_log", "boom");
        assert!(matches!(err, LoggerError::PluginError { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::config("timeFormat", "unknown format 'rfc'");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for timeFormat: unknown format 'rfc'"
        );

        let err = LoggerError::plugin("upper", "after_log", "boom");
        assert_eq!(err.to_string(), "Plugin 'upper' failed in after_log: boom");

        let err = LoggerError::FlushTimeout {
            timeout: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "Flush did not complete within 250ms");
    }

    #[test]
    fn test_sink_write_error_keeps_source() {
        use std::error::Error as _;

        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = LoggerError::sink_write("stderr", io_err);

        assert!(err.to_string().contains("stderr"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "Unknown panic");
    }
}
