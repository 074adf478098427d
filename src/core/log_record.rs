//! Per-call record: payload, options and the context handed to plugins

use super::codec::Codec;
use super::error::Result;
use super::error_cache::ErrorReport;
use super::log_level::LogLevel;
use serde::Serialize;

/// What a log call carries before it is turned into text
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    /// Structured value, rendered as pretty JSON
    Value(serde_json::Value),
    /// Routed through the error cache
    Error(ErrorReport),
}

impl Payload {
    /// Serialize any value into a structured payload
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Payload::Value(serde_json::to_value(value)?))
    }

    /// Wrap any error, keeping its `source()` chain as stack frames
    pub fn error<E: std::error::Error + ?Sized>(error: &E) -> Self {
        Payload::Error(ErrorReport::from_error(error))
    }

    /// Text for non-error payloads
    ///
    /// Objects and arrays are pretty-printed, JSON strings are used as-is and every other
    /// scalar uses its JSON text. Errors return `None`; they are rendered by the error cache.
    pub fn render_text(&self) -> Option<String> {
        match self {
            Payload::Text(text) => Some(text.clone()),
            Payload::Value(serde_json::Value::String(text)) => Some(text.clone()),
            Payload::Value(value @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => {
                Some(serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()))
            }
            Payload::Value(value) => Some(value.to_string()),
            Payload::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Payload::Error(_))
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&String> for Payload {
    fn from(text: &String) -> Self {
        Payload::Text(text.clone())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Value(value)
    }
}

impl From<ErrorReport> for Payload {
    fn from(report: ErrorReport) -> Self {
        Payload::Error(report)
    }
}

/// Per-call overrides; unset values fall back to the shared configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogOptions {
    pub color: Option<String>,
    pub codec: Option<Codec>,
    pub show_timestamp: Option<bool>,
    pub show_level: Option<bool>,
}

impl LogOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = Some(codec);
        self
    }

    #[must_use]
    pub fn timestamp(mut self, show: bool) -> Self {
        self.show_timestamp = Some(show);
        self
    }

    #[must_use]
    pub fn level(mut self, show: bool) -> Self {
        self.show_level = Some(show);
        self
    }
}

/// Read-only view of one call, passed to plugin hooks
#[derive(Debug, Clone, Copy)]
pub struct LogRecord<'a> {
    pub level: LogLevel,
    pub payload: &'a Payload,
    pub options: &'a LogOptions,
    pub scope: Option<&'a str>,
}

impl<'a> LogRecord<'a> {
    pub fn new(
        level: LogLevel,
        payload: &'a Payload,
        options: &'a LogOptions,
        scope: Option<&'a str>,
    ) -> Self {
        Self {
            level,
            payload,
            options,
            scope,
        }
    }
}
