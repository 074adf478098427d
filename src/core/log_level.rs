//! Log level definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Plain output, no particular severity
    #[default]
    Log,
    Info,
    Success,
    Warn,
    Error,
    /// Only emitted when debug mode is enabled
    Debug,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Log,
        LogLevel::Info,
        LogLevel::Success,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Debug,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Log => "log",
            LogLevel::Info => "info",
            LogLevel::Success => "success",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Debug => "debug",
        }
    }

    /// Upper-case tag used in the level segment
    pub fn tag(&self) -> &'static str {
        match self {
            LogLevel::Log => "LOG",
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Warn and error go to the elevated sink, everything else to the normal one
    pub fn sink(&self) -> SinkKind {
        match self {
            LogLevel::Warn | LogLevel::Error => SinkKind::Elevated,
            _ => SinkKind::Normal,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log" | "plain" => Ok(LogLevel::Log),
            "info" => Ok(LogLevel::Info),
            "success" => Ok(LogLevel::Success),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "debug" => Ok(LogLevel::Debug),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// One of the two text targets a line can be delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// stdout in the default setup
    Normal,
    /// stderr in the default setup
    Elevated,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Normal => "stdout",
            SinkKind::Elevated => "stderr",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_routing() {
        assert_eq!(LogLevel::Warn.sink(), SinkKind::Elevated);
        assert_eq!(LogLevel::Error.sink(), SinkKind::Elevated);
        for level in [LogLevel::Log, LogLevel::Info, LogLevel::Success, LogLevel::Debug] {
            assert_eq!(level.sink(), SinkKind::Normal, "{level} should use stdout");
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("plain".parse::<LogLevel>(), Ok(LogLevel::Log));
        assert!("fatal".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&LogLevel::Success).unwrap();
        assert_eq!(json, "\"success\"");
        let level: LogLevel = serde_json::from_str("\"debug\"").unwrap();
        assert_eq!(level, LogLevel::Debug);
    }
}
