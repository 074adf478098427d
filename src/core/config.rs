//! Shared logger configuration
//!
//! One [`Config`] is shared (through [`SharedConfig`]) by a logger, its children and any other
//! logger built from the same handle. It only changes through [`Config::merge`] and
//! [`Config::reset`]; invalid values are rejected with a warning and the previous value kept.

use super::codec::Codec;
use super::error::LoggerError;
use super::log_level::LogLevel;
use super::timestamp::TimeFormat;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Configuration handle shared between loggers
pub type SharedConfig = Arc<RwLock<Config>>;

/// Environment variable that switches the default buffering off when set to `test`
pub const ENV_VAR: &str = "SPECTRAL_ENV";

fn default_buffering() -> bool {
    static BUFFERING: OnceLock<bool> = OnceLock::new();
    *BUFFERING.get_or_init(|| std::env::var(ENV_VAR).map_or(true, |env| env != "test"))
}

/// Default color per level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelColors {
    pub log: String,
    pub info: String,
    pub success: String,
    pub warn: String,
    pub error: String,
    pub debug: String,
}

impl Default for LevelColors {
    fn default() -> Self {
        Self {
            log: "#dddddd".to_string(),
            info: "#00bfff".to_string(),
            success: "#00ff88".to_string(),
            warn: "#ffaa00".to_string(),
            error: "#ff5555".to_string(),
            debug: "#cc66ff".to_string(),
        }
    }
}

impl LevelColors {
    pub fn get(&self, level: LogLevel) -> &str {
        match level {
            LogLevel::Log => &self.log,
            LogLevel::Info => &self.info,
            LogLevel::Success => &self.success,
            LogLevel::Warn => &self.warn,
            LogLevel::Error => &self.error,
            LogLevel::Debug => &self.debug,
        }
    }

    pub fn set(&mut self, level: LogLevel, color: impl Into<String>) {
        let slot = match level {
            LogLevel::Log => &mut self.log,
            LogLevel::Info => &mut self.info,
            LogLevel::Success => &mut self.success,
            LogLevel::Warn => &mut self.warn,
            LogLevel::Error => &mut self.error,
            LogLevel::Debug => &mut self.debug,
        };
        *slot = color.into();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub colors: LevelColors,
    /// Show the `[HH:MM:SS]` prefix
    pub show_timestamp: bool,
    /// Show the `[LEVEL]` tag
    pub show_level: bool,
    /// Emit debug-level calls
    pub debug_mode: bool,
    /// Buffer sink writes; `None` falls back to the environment default
    pub buffer_writes: Option<bool>,
    pub time_format: TimeFormat,
    pub codec: Codec,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            colors: LevelColors::default(),
            show_timestamp: true,
            show_level: true,
            debug_mode: false,
            buffer_writes: None,
            time_format: TimeFormat::default(),
            codec: Codec::default(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap this config for sharing between loggers
    #[must_use]
    pub fn shared(self) -> SharedConfig {
        Arc::new(RwLock::new(self))
    }

    /// Whether writes are buffered, after applying the environment default
    pub fn buffering_enabled(&self) -> bool {
        self.buffer_writes.unwrap_or_else(default_buffering)
    }

    /// Copy with every optional value resolved
    #[must_use]
    pub fn resolved(&self) -> Self {
        Self {
            buffer_writes: Some(self.buffering_enabled()),
            ..self.clone()
        }
    }

    pub fn color_for(&self, level: LogLevel) -> &str {
        self.colors.get(level)
    }

    /// Restore every option to its default
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply `options` on top of the current values
    ///
    /// Colors that `is_valid_color` rejects are skipped and reported in the returned list;
    /// everything else is still applied.
    pub fn merge(
        &mut self,
        options: ConfigOptions,
        is_valid_color: impl Fn(&str) -> bool,
    ) -> Vec<LoggerError> {
        let mut warnings = Vec::new();

        if let Some(codec) = options.codec {
            self.codec = codec;
        }
        if let Some(show) = options.show_timestamp {
            self.show_timestamp = show;
        }
        if let Some(show) = options.show_level {
            self.show_level = show;
        }
        if let Some(debug) = options.debug_mode {
            self.debug_mode = debug;
        }
        if let Some(buffer) = options.buffer_writes {
            self.buffer_writes = Some(buffer);
        }
        if let Some(format) = options.time_format {
            self.time_format = format;
        }
        for (level, color) in options.colors {
            if is_valid_color(&color) {
                self.colors.set(level, color);
            } else {
                warnings.push(LoggerError::config(
                    format!("colors.{}", level),
                    format!("unrecognized color '{}', keeping '{}'", color, self.colors.get(level)),
                ));
            }
        }

        warnings
    }
}

/// Partial configuration; unset fields leave the current value untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigOptions {
    pub colors: HashMap<LogLevel, String>,
    pub show_timestamp: Option<bool>,
    pub show_level: Option<bool>,
    pub debug_mode: Option<bool>,
    pub buffer_writes: Option<bool>,
    pub time_format: Option<TimeFormat>,
    pub codec: Option<Codec>,
}

impl ConfigOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn color(mut self, level: LogLevel, color: impl Into<String>) -> Self {
        self.colors.insert(level, color.into());
        self
    }

    #[must_use]
    pub fn show_timestamp(mut self, show: bool) -> Self {
        self.show_timestamp = Some(show);
        self
    }

    #[must_use]
    pub fn show_level(mut self, show: bool) -> Self {
        self.show_level = Some(show);
        self
    }

    #[must_use]
    pub fn debug_mode(mut self, enabled: bool) -> Self {
        self.debug_mode = Some(enabled);
        self
    }

    #[must_use]
    pub fn buffer_writes(mut self, enabled: bool) -> Self {
        self.buffer_writes = Some(enabled);
        self
    }

    #[must_use]
    pub fn time_format(mut self, format: TimeFormat) -> Self {
        self.time_format = Some(format);
        self
    }

    #[must_use]
    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Read options from an untyped JSON object
    ///
    /// Unknown keys and values of the wrong shape are reported as warnings and skipped;
    /// they never prevent the remaining keys from being read.
    pub fn from_json(value: &serde_json::Value) -> (Self, Vec<LoggerError>) {
        let mut options = Self::default();
        let mut warnings = Vec::new();

        let Some(object) = value.as_object() else {
            warnings.push(LoggerError::config("options", "expected a JSON object"));
            return (options, warnings);
        };

        for (key, value) in object {
            match key.as_str() {
                "colors" => options.read_colors(value, &mut warnings),
                "showTimestamp" | "show_timestamp" => {
                    options.show_timestamp = expect_bool(key, value, &mut warnings);
                }
                "showLevel" | "show_level" => {
                    options.show_level = expect_bool(key, value, &mut warnings);
                }
                "debugMode" | "debug_mode" => {
                    options.debug_mode = expect_bool(key, value, &mut warnings);
                }
                "bufferWrites" | "buffer_writes" => {
                    options.buffer_writes = expect_bool(key, value, &mut warnings);
                }
                "timeFormat" | "time_format" => {
                    options.time_format = expect_parsed(key, value, &mut warnings);
                }
                "codec" => {
                    options.codec = expect_parsed(key, value, &mut warnings);
                }
                _ => warnings.push(LoggerError::config(
                    key.clone(),
                    "unknown option ignored",
                )),
            }
        }

        (options, warnings)
    }

    fn read_colors(&mut self, value: &serde_json::Value, warnings: &mut Vec<LoggerError>) {
        let Some(colors) = value.as_object() else {
            warnings.push(LoggerError::config("colors", "expected an object of level colors"));
            return;
        };
        for (level, color) in colors {
            let component = format!("colors.{}", level);
            match (level.parse::<LogLevel>(), color.as_str()) {
                (Ok(level), Some(color)) => {
                    self.colors.insert(level, color.to_string());
                }
                (Err(_), _) => warnings.push(LoggerError::config(component, "unknown level ignored")),
                (_, None) => warnings.push(LoggerError::config(component, "expected a color string")),
            }
        }
    }
}

fn expect_bool(
    key: &str,
    value: &serde_json::Value,
    warnings: &mut Vec<LoggerError>,
) -> Option<bool> {
    let parsed = value.as_bool();
    if parsed.is_none() {
        warnings.push(LoggerError::config(key, format!("expected a boolean, got {}", value)));
    }
    parsed
}

fn expect_parsed<T: std::str::FromStr<Err = String>>(
    key: &str,
    value: &serde_json::Value,
    warnings: &mut Vec<LoggerError>,
) -> Option<T> {
    match value.as_str().map(str::parse::<T>) {
        Some(Ok(parsed)) => Some(parsed),
        Some(Err(message)) => {
            warnings.push(LoggerError::config(key, message));
            None
        }
        None => {
            warnings.push(LoggerError::config(key, format!("expected a string, got {}", value)));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn any_color(_: &str) -> bool {
        true
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.show_timestamp);
        assert!(config.show_level);
        assert!(!config.debug_mode);
        assert_eq!(config.buffer_writes, None);
        assert_eq!(config.time_format, TimeFormat::Iso);
        assert_eq!(config.codec, Codec::Utf8);
        assert_eq!(config.color_for(LogLevel::Info), "#00bfff");
        assert_eq!(config.color_for(LogLevel::Error), "#ff5555");
    }

    #[test]
    fn test_merge_only_touches_set_fields() {
        let mut config = Config::default();
        let warnings = config.merge(
            ConfigOptions::new()
                .debug_mode(true)
                .color(LogLevel::Info, "#123456"),
            any_color,
        );

        assert!(warnings.is_empty());
        assert!(config.debug_mode);
        assert!(config.show_timestamp);
        assert_eq!(config.color_for(LogLevel::Info), "#123456");
        assert_eq!(config.color_for(LogLevel::Warn), "#ffaa00");
    }

    #[test]
    fn test_merge_rejects_bad_color_and_keeps_previous() {
        let mut config = Config::default();
        let warnings = config.merge(
            ConfigOptions::new()
                .color(LogLevel::Warn, "not-a-color")
                .show_level(false),
            |color| color.starts_with('#'),
        );

        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].to_string().contains("colors.warn"));
        assert_eq!(config.color_for(LogLevel::Warn), "#ffaa00");
        assert!(!config.show_level);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut config = Config::default();
        config.merge(
            ConfigOptions::new().buffer_writes(false).codec(Codec::Ascii),
            any_color,
        );
        config.reset();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_resolved_buffering() {
        let config = Config {
            buffer_writes: Some(false),
            ..Config::default()
        };
        assert!(!config.buffering_enabled());
        assert_eq!(config.resolved().buffer_writes, Some(false));
        assert!(Config::default().resolved().buffer_writes.is_some());
    }

    #[test]
    fn test_from_json_reads_known_keys() {
        let (options, warnings) = ConfigOptions::from_json(&json!({
            "showTimestamp": false,
            "debugMode": true,
            "timeFormat": "unix",
            "codec": "latin1",
            "colors": { "info": "#abcdef" }
        }));

        assert!(warnings.is_empty());
        assert_eq!(options.show_timestamp, Some(false));
        assert_eq!(options.debug_mode, Some(true));
        assert_eq!(options.time_format, Some(TimeFormat::Unix));
        assert_eq!(options.codec, Some(Codec::Latin1));
        assert_eq!(options.colors.get(&LogLevel::Info).map(String::as_str), Some("#abcdef"));
    }

    #[test]
    fn test_from_json_flags_unknown_and_invalid() {
        let (options, warnings) = ConfigOptions::from_json(&json!({
            "verbose": true,
            "timeFormat": "rfc2822",
            "showLevel": "yes",
            "debugMode": true,
            "colors": { "fatal": "#ff0000" }
        }));

        assert_eq!(warnings.len(), 4);
        assert_eq!(options.time_format, None);
        assert_eq!(options.show_level, None);
        assert_eq!(options.debug_mode, Some(true));
        assert!(options.colors.is_empty());
    }

    #[test]
    fn test_serde_camel_case() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["showTimestamp"], true);
        assert_eq!(json["timeFormat"], "iso");
        assert_eq!(json["codec"], "utf-8");

        let options: ConfigOptions =
            serde_json::from_value(json!({ "debugMode": true, "colors": { "warn": "red" } }))
                .unwrap();
        assert_eq!(options.debug_mode, Some(true));
        assert_eq!(options.colors.get(&LogLevel::Warn).map(String::as_str), Some("red"));
    }
}
