//! Logger implementation
//!
//! A [`Logger`] stringifies each payload, runs the plugin pipeline, renders the line and hands it
//! to the shared [`OutputQueue`]. Loggers created through [`Logger::child`] or `clone` share the
//! configuration, color registry, error cache and output queue of their parent; each carries its
//! own scope label and its own copy of the plugin list.
//!
//! Separately built loggers keep one call order per sink only when they share an output queue:
//! pass [`Logger::output`] to [`LoggerBuilder::output`]. Loggers that write to the process
//! console share one queue automatically while any of them is alive.

use super::color::{ColorResolver, ColorSupport};
use super::config::{Config, ConfigOptions, SharedConfig};
use super::diagnostics::{report, stderr_handler, DiagnosticHandler};
use super::error::{LoggerError, Result};
use super::error_cache::{ErrorCacheEntry, ErrorDeduplicator, DEFAULT_ERROR_CACHE_CAPACITY};
use super::formatter::{self, ConsoleLine, Formatter};
use super::log_level::{LogLevel, SinkKind};
use super::log_record::{LogOptions, LogRecord, Payload};
use super::metrics::OutputMetrics;
use super::output_queue::{OutputQueue, QueueOptions};
use super::plugin::{Plugin, PluginPipeline};
use super::sink::Sink;
use crate::sinks::ConsoleSink;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Default timeout for shutdown operations
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// State shared by a logger and every logger derived from it
struct Shared {
    config: SharedConfig,
    colors: Mutex<ColorResolver>,
    errors: Mutex<ErrorDeduplicator>,
    output: Arc<OutputQueue>,
    diagnostics: DiagnosticHandler,
}

/// Queue shared by every logger writing to the process stdout and stderr
static CONSOLE_OUTPUT: Mutex<Weak<OutputQueue>> = parking_lot::const_mutex(Weak::new());

fn console_output(options: QueueOptions, diagnostics: &DiagnosticHandler) -> Result<Arc<OutputQueue>> {
    let mut slot = CONSOLE_OUTPUT.lock();
    if let Some(existing) = slot.upgrade().filter(|queue| !queue.is_stopped()) {
        if *existing.options() != options {
            report(
                diagnostics,
                &LoggerError::config("queue", "console output is already running; its options are kept"),
            );
        }
        return Ok(existing);
    }

    let output = Arc::new(OutputQueue::new(
        Box::new(ConsoleSink::for_kind(SinkKind::Normal)),
        Box::new(ConsoleSink::for_kind(SinkKind::Elevated)),
        options,
        Arc::clone(diagnostics),
    )?);
    *slot = Arc::downgrade(&output);
    Ok(output)
}

pub struct Logger {
    shared: Arc<Shared>,
    scope: Option<String>,
    plugins: RwLock<PluginPipeline>,
}

impl Logger {
    /// Logger writing to the process stdout and stderr with default settings
    pub fn new() -> Result<Self> {
        LoggerBuilder::new().build()
    }

    /// Scope label prepended to every message, if any
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Derive a scoped logger
    ///
    /// Nested children join their labels with `:`, so `child("db").child("pool")` prefixes
    /// messages with `[db:pool]`.
    pub fn child(&self, scope: impl Into<String>) -> Logger {
        let scope = scope.into();
        let scope = match &self.scope {
            Some(parent) => format!("{}:{}", parent, scope),
            None => scope,
        };
        Logger {
            shared: Arc::clone(&self.shared),
            scope: Some(scope),
            plugins: RwLock::new(self.plugins.read().clone()),
        }
    }

    pub fn log(&self, payload: impl Into<Payload>) {
        self.emit(LogLevel::Log, payload, LogOptions::default());
    }

    pub fn info(&self, payload: impl Into<Payload>) {
        self.emit(LogLevel::Info, payload, LogOptions::default());
    }

    pub fn success(&self, payload: impl Into<Payload>) {
        self.emit(LogLevel::Success, payload, LogOptions::default());
    }

    pub fn warn(&self, payload: impl Into<Payload>) {
        self.emit(LogLevel::Warn, payload, LogOptions::default());
    }

    pub fn error(&self, payload: impl Into<Payload>) {
        self.emit(LogLevel::Error, payload, LogOptions::default());
    }

    /// Emitted only while debug mode is on
    pub fn debug(&self, payload: impl Into<Payload>) {
        self.emit(LogLevel::Debug, payload, LogOptions::default());
    }

    pub fn log_with(&self, payload: impl Into<Payload>, options: LogOptions) {
        self.emit(LogLevel::Log, payload, options);
    }

    pub fn info_with(&self, payload: impl Into<Payload>, options: LogOptions) {
        self.emit(LogLevel::Info, payload, options);
    }

    pub fn success_with(&self, payload: impl Into<Payload>, options: LogOptions) {
        self.emit(LogLevel::Success, payload, options);
    }

    pub fn warn_with(&self, payload: impl Into<Payload>, options: LogOptions) {
        self.emit(LogLevel::Warn, payload, options);
    }

    pub fn error_with(&self, payload: impl Into<Payload>, options: LogOptions) {
        self.emit(LogLevel::Error, payload, options);
    }

    pub fn debug_with(&self, payload: impl Into<Payload>, options: LogOptions) {
        self.emit(LogLevel::Debug, payload, options);
    }

    /// Run one call through stringify, before hooks, scope, formatting, queue and after hooks
    ///
    /// Never fails: plugin, formatting and queue errors go to the diagnostic handler.
    pub fn emit(&self, level: LogLevel, payload: impl Into<Payload>, options: LogOptions) {
        // Snapshot so hooks may reconfigure without deadlocking
        let config = self.shared.config.read().clone();
        if level == LogLevel::Debug && !config.debug_mode {
            return;
        }

        let payload = payload.into();
        let message = self.stringify(&payload, &config);
        let record = LogRecord::new(level, &payload, &options, self.scope.as_deref());
        let plugins = self.plugins.read().clone();
        let diagnostics = &self.shared.diagnostics;

        let message = plugins.run_before(message, &record, diagnostics);
        let message = match &self.scope {
            Some(scope) => format!("[{}] {}", scope, message),
            None => message,
        };

        let line = {
            let mut colors = self.shared.colors.lock();
            Formatter::new(&config, &mut colors).format(&message, level, &options)
        };
        let codec = options.codec.unwrap_or(config.codec);
        let mut bytes = codec.encode(&line);
        bytes.extend(codec.encode("\n"));

        if let Err(e) = self
            .shared
            .output
            .enqueue(level.sink(), bytes, config.buffering_enabled())
        {
            report(diagnostics, &e);
        }

        plugins.run_after(&message, &record, diagnostics);
    }

    fn stringify(&self, payload: &Payload, config: &Config) -> String {
        if let Some(text) = payload.render_text() {
            return text;
        }
        match payload {
            Payload::Error(report) => {
                let mut colors = self.shared.colors.lock();
                let mut formatter = Formatter::new(config, &mut colors);
                self.shared.errors.lock().handle(report, &mut formatter)
            }
            _ => String::new(),
        }
    }

    /// Merge `options` into the shared configuration
    ///
    /// Rejected values are reported to the diagnostic handler and returned; the rest is applied.
    pub fn configure(&self, options: ConfigOptions) -> Vec<LoggerError> {
        let warnings = {
            let colors = self.shared.colors.lock();
            self.shared
                .config
                .write()
                .merge(options, |color| colors.is_known(color))
        };
        for warning in &warnings {
            report(&self.shared.diagnostics, warning);
        }
        warnings
    }

    /// Merge an untyped JSON options object; unknown keys are flagged and skipped
    pub fn configure_json(&self, options: &serde_json::Value) -> Vec<LoggerError> {
        let (options, mut warnings) = ConfigOptions::from_json(options);
        for warning in &warnings {
            report(&self.shared.diagnostics, warning);
        }
        warnings.extend(self.configure(options));
        warnings
    }

    pub fn reset_config(&self) {
        self.shared.config.write().reset();
    }

    /// Snapshot of the configuration with every default resolved
    pub fn get_config(&self) -> Config {
        self.shared.config.read().resolved()
    }

    /// Handle to the configuration shared with this logger
    pub fn shared_config(&self) -> SharedConfig {
        Arc::clone(&self.shared.config)
    }

    /// Register `plugin`, replacing one with the same name, then run its init hook
    pub fn use_plugin(&self, plugin: Arc<dyn Plugin>) {
        self.plugins.write().register(Arc::clone(&plugin));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| plugin.init(self)));
        let failure = match result {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(panic_info) => Some(format!(
                "panicked: {}",
                super::error::panic_message(panic_info.as_ref())
            )),
        };
        if let Some(message) = failure {
            report(
                &self.shared.diagnostics,
                &LoggerError::plugin(plugin.name(), "init", message),
            );
        }
    }

    /// Remove a plugin by name; `false` if none was registered
    pub fn remove_plugin(&self, name: &str) -> bool {
        self.plugins.write().remove(name).is_some()
    }

    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.read().names()
    }

    /// Ask both sinks to write out what they buffer, without waiting
    pub fn flush(&self) {
        self.shared.output.flush();
    }

    /// Return once everything logged before this call has reached its sink
    pub fn flush_blocking(&self) -> Result<()> {
        let timeout = self.shared.output.options().flush_timeout;
        self.shared.output.force_flush(timeout)
    }

    /// Awaitable variant of [`Logger::flush_blocking`]
    #[cfg(feature = "async")]
    pub async fn flush_async(&self) -> Result<()> {
        self.shared.output.flush_async().await
    }

    /// Handle to the output queue, for building more loggers that share its ordering
    pub fn output(&self) -> Arc<OutputQueue> {
        Arc::clone(&self.shared.output)
    }

    /// Drain both sinks and stop their workers
    ///
    /// Affects every logger sharing this output queue. Returns `false` on timeout.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.shared.output.shutdown(timeout)
    }

    /// Every cached error signature, oldest first
    pub fn error_stats(&self) -> Vec<ErrorCacheEntry> {
        self.shared.errors.lock().snapshot()
    }

    pub fn clear_error_cache(&self) {
        self.shared.errors.lock().clear();
    }

    /// Paint `text` for the terminal; a level name resolves to that level's color
    pub fn color(&self, text: &str, token: &str) -> String {
        let config = self.shared.config.read().clone();
        let mut colors = self.shared.colors.lock();
        Formatter::new(&config, &mut colors).paint(text, token)
    }

    /// Register or override a named color
    pub fn add_color(&self, name: &str, color: &str) -> Result<()> {
        self.shared.colors.lock().add_custom_color(name, color)
    }

    /// Wrap `text` in an inline color marker, expanded when the line is rendered
    pub fn markup(&self, text: &str, token: &str) -> String {
        formatter::markup(text, token)
    }

    /// Render a call for a host console that applies one CSS style per `%c` segment
    ///
    /// Pure rendering: plugins do not run, the error cache is not updated and nothing is queued.
    pub fn render_console(
        &self,
        level: LogLevel,
        payload: impl Into<Payload>,
        options: &LogOptions,
    ) -> ConsoleLine {
        let config = self.shared.config.read().clone();
        let payload = payload.into();
        let mut colors = self.shared.colors.lock();
        let mut formatter = Formatter::new(&config, &mut colors);

        match (&payload, payload.render_text()) {
            (_, Some(text)) => {
                let message = match &self.scope {
                    Some(scope) => format!("[{}] {}", scope, text),
                    None => text,
                };
                formatter.format_console(&message, level, options)
            }
            (Payload::Error(report), None) => formatter.format_error_console(report),
            (_, None) => ConsoleLine::default(),
        }
    }

    /// Current time in the configured format
    pub fn timestamp(&self) -> String {
        self.shared.config.read().time_format.now()
    }

    /// Snapshot of one sink's counters
    pub fn metrics(&self, kind: SinkKind) -> OutputMetrics {
        self.shared.output.metrics(kind).clone()
    }

    /// Override terminal color detection for every logger sharing this registry
    pub fn set_color_support(&self, support: ColorSupport) {
        self.shared.colors.lock().set_support(support);
    }

    pub fn color_support(&self) -> ColorSupport {
        self.shared.colors.lock().support()
    }
}

impl Clone for Logger {
    /// Same shared state and scope, independent copy of the plugin list
    fn clone(&self) -> Self {
        Logger {
            shared: Arc::clone(&self.shared),
            scope: self.scope.clone(),
            plugins: RwLock::new(self.plugins.read().clone()),
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("scope", &self.scope)
            .field("plugins", &*self.plugins.read())
            .field("output", &self.shared.output)
            .finish()
    }
}

/// Builder for Logger
///
/// # Example
/// ```
/// use spectral_logger::prelude::*;
/// use spectral_logger::sinks::MemorySink;
///
/// let stdout = MemorySink::new("stdout");
/// let logger = Logger::builder()
///     .normal_sink(stdout.clone())
///     .elevated_sink(MemorySink::new("stderr"))
///     .color_support(ColorSupport::None)
///     .buffered(false)
///     .build()
///     .unwrap();
///
/// logger.info("ready");
/// logger.flush_blocking().unwrap();
/// assert!(stdout.contents().contains("[INFO]"));
/// ```
pub struct LoggerBuilder {
    config: Option<SharedConfig>,
    options: ConfigOptions,
    output: Option<Arc<OutputQueue>>,
    normal: Option<Box<dyn Sink>>,
    elevated: Option<Box<dyn Sink>>,
    queue: QueueOptions,
    color_support: Option<ColorSupport>,
    diagnostics: Option<DiagnosticHandler>,
    scope: Option<String>,
    error_cache_capacity: usize,
    plugins: Vec<Arc<dyn Plugin>>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            options: ConfigOptions::default(),
            output: None,
            normal: None,
            elevated: None,
            queue: QueueOptions::default(),
            color_support: None,
            diagnostics: None,
            scope: None,
            error_cache_capacity: DEFAULT_ERROR_CACHE_CAPACITY,
            plugins: Vec::new(),
        }
    }

    /// Share an existing configuration instead of creating a fresh one
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: SharedConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Options merged into the configuration when the logger is built
    #[must_use = "builder methods return a new value"]
    pub fn options(mut self, options: ConfigOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn debug_mode(mut self, enabled: bool) -> Self {
        self.options.debug_mode = Some(enabled);
        self
    }

    /// Buffer writes (overrides the environment default)
    #[must_use = "builder methods return a new value"]
    pub fn buffered(mut self, enabled: bool) -> Self {
        self.options.buffer_writes = Some(enabled);
        self
    }

    /// Write through an existing output queue
    ///
    /// Lines from every logger on one queue reach each sink in call order. Takes precedence over
    /// the sink and queue option setters.
    #[must_use = "builder methods return a new value"]
    pub fn output(mut self, output: Arc<OutputQueue>) -> Self {
        self.output = Some(output);
        self
    }

    /// Target for log, info, success and debug lines (stdout by default)
    #[must_use = "builder methods return a new value"]
    pub fn normal_sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.normal = Some(Box::new(sink));
        self
    }

    /// Target for warn and error lines (stderr by default)
    #[must_use = "builder methods return a new value"]
    pub fn elevated_sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.elevated = Some(Box::new(sink));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn queue_options(mut self, options: QueueOptions) -> Self {
        self.queue = options;
        self
    }

    /// Fix the terminal color depth instead of probing the environment
    #[must_use = "builder methods return a new value"]
    pub fn color_support(mut self, support: ColorSupport) -> Self {
        self.color_support = Some(support);
        self
    }

    /// Receive the logger's own failures (stderr by default)
    #[must_use = "builder methods return a new value"]
    pub fn diagnostics(mut self, handler: DiagnosticHandler) -> Self {
        self.diagnostics = Some(handler);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn error_cache_capacity(mut self, capacity: usize) -> Self {
        self.error_cache_capacity = capacity;
        self
    }

    /// Register a plugin once the logger exists
    #[must_use = "builder methods return a new value"]
    pub fn plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Build the Logger and start its sink workers
    pub fn build(self) -> Result<Logger> {
        let diagnostics = self.diagnostics.unwrap_or_else(stderr_handler);
        let colors = match self.color_support {
            Some(support) => ColorResolver::with_support(support),
            None => ColorResolver::new(),
        };

        let config = self.config.unwrap_or_else(|| Config::default().shared());
        let warnings = config
            .write()
            .merge(self.options, |color| colors.is_known(color));
        for warning in &warnings {
            report(&diagnostics, warning);
        }

        let output = match (self.output, self.normal, self.elevated) {
            (Some(output), _, _) => output,
            (None, None, None) => console_output(self.queue, &diagnostics)?,
            (None, normal, elevated) => {
                let normal = normal.unwrap_or_else(|| Box::new(ConsoleSink::for_kind(SinkKind::Normal)));
                let elevated =
                    elevated.unwrap_or_else(|| Box::new(ConsoleSink::for_kind(SinkKind::Elevated)));
                Arc::new(OutputQueue::new(normal, elevated, self.queue, Arc::clone(&diagnostics))?)
            }
        };

        let logger = Logger {
            shared: Arc::new(Shared {
                config,
                colors: Mutex::new(colors),
                errors: Mutex::new(ErrorDeduplicator::with_capacity(self.error_cache_capacity)),
                output,
                diagnostics,
            }),
            scope: self.scope,
            plugins: RwLock::new(PluginPipeline::new()),
        };

        for plugin in self.plugins {
            logger.use_plugin(plugin);
        }
        Ok(logger)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error_cache::ErrorReport;
    use crate::sinks::MemorySink;

    struct Capture {
        logger: Logger,
        stdout: MemorySink,
        stderr: MemorySink,
        diagnostics: Arc<Mutex<Vec<String>>>,
    }

    fn capture(builder: LoggerBuilder) -> Capture {
        let stdout = MemorySink::new("stdout");
        let stderr = MemorySink::new("stderr");
        let diagnostics = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&diagnostics);
        let logger = builder
            .normal_sink(stdout.clone())
            .elevated_sink(stderr.clone())
            .color_support(ColorSupport::None)
            .diagnostics(Arc::new(move |e: &LoggerError| seen.lock().push(e.to_string())))
            .build()
            .unwrap();
        Capture {
            logger,
            stdout,
            stderr,
            diagnostics,
        }
    }

    fn body(line: &str) -> &str {
        // "[HH:MM:SS] [LEVEL]   message"
        &line[11 + LEVEL_WIDTH..]
    }

    const LEVEL_WIDTH: usize = crate::core::formatter::LEVEL_COLUMN_WIDTH + 1;

    #[test]
    fn test_builder_basic() {
        let c = capture(Logger::builder().buffered(false));
        assert!(c.logger.scope().is_none());
        assert!(c.logger.plugin_names().is_empty());
        assert_eq!(c.logger.get_config().buffer_writes, Some(false));
    }

    #[test]
    fn test_levels_route_to_sinks() {
        let c = capture(Logger::builder().buffered(false).debug_mode(true));
        c.logger.log("a");
        c.logger.info("b");
        c.logger.success("c");
        c.logger.debug("d");
        c.logger.warn("e");
        c.logger.error("f");
        c.logger.flush_blocking().unwrap();

        let out: Vec<String> = c.stdout.lines().iter().map(|l| body(l).to_string()).collect();
        let err: Vec<String> = c.stderr.lines().iter().map(|l| body(l).to_string()).collect();
        assert_eq!(out, vec!["a", "b", "c", "d"]);
        assert_eq!(err, vec!["e", "f"]);
    }

    #[test]
    fn test_object_payload_is_pretty_printed() {
        let c = capture(Logger::builder().buffered(false));
        c.logger
            .info_with(serde_json::json!({ "a": 1 }), LogOptions::new().timestamp(false).level(false));
        c.logger.flush_blocking().unwrap();
        assert_eq!(c.stdout.contents(), "{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn test_error_payload_goes_through_cache() {
        let c = capture(Logger::builder().buffered(false));
        let report = ErrorReport::new("TypeError", "bad");
        c.logger.error(report.clone());
        c.logger.error(report);
        c.logger.flush_blocking().unwrap();

        let stats = c.logger.error_stats();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].count, 2);
        assert!(c.stderr.contents().contains("(This error occurred 2 times)"));

        c.logger.clear_error_cache();
        assert!(c.logger.error_stats().is_empty());
    }

    #[test]
    fn test_child_scope_nesting_and_sharing() {
        let c = capture(Logger::builder().buffered(false));
        let pool = c.logger.child("db").child("pool");
        assert_eq!(pool.scope(), Some("db:pool"));

        pool.info("open");
        c.logger.flush_blocking().unwrap();
        assert_eq!(body(&c.stdout.lines()[0]), "[db:pool] open");

        // Configuration is shared
        pool.configure(ConfigOptions::new().debug_mode(true));
        assert!(c.logger.get_config().debug_mode);
    }

    #[test]
    fn test_codec_override() {
        let c = capture(Logger::builder().buffered(false));
        c.logger.log_with(
            "é",
            LogOptions::new().timestamp(false).level(false).codec(crate::core::Codec::Latin1),
        );
        c.logger.flush_blocking().unwrap();
        assert_eq!(c.stdout.bytes(), vec![0xE9, b'\n']);
    }

    #[test]
    fn test_configure_reports_rejected_values() {
        let c = capture(Logger::builder());
        let warnings = c
            .logger
            .configure(ConfigOptions::new().color(LogLevel::Info, "sparkly").show_level(false));
        assert_eq!(warnings.len(), 1);
        assert_eq!(c.diagnostics.lock().len(), 1);
        assert_eq!(c.logger.get_config().color_for(LogLevel::Info), "#00bfff");
        assert!(!c.logger.get_config().show_level);

        let warnings = c
            .logger
            .configure_json(&serde_json::json!({ "timeFormat": "unix", "loud": true }));
        assert_eq!(warnings.len(), 1);
        assert_eq!(c.logger.get_config().time_format, crate::core::TimeFormat::Unix);
        assert!(c.logger.timestamp().chars().all(|ch| ch.is_ascii_digit()));

        c.logger.reset_config();
        assert!(c.logger.get_config().show_level);
    }

    #[test]
    fn test_custom_colors_and_markup() {
        let c = capture(Logger::builder().buffered(false));
        c.logger.set_color_support(ColorSupport::TrueColor);
        c.logger.add_color("brand", "#123456").unwrap();
        assert!(c.logger.add_color("brand", "nope").is_err());

        assert_eq!(c.logger.color("x", "brand"), "\x1b[38;2;18;52;86mx\x1b[0m");
        assert_eq!(
            c.logger.color("x", "warn"),
            c.logger.color("x", "#ffaa00")
        );

        let marked = c.logger.markup("ok", "brand");
        assert_eq!(marked, "<<c:brand>>ok<</c>>");
        c.logger.info(format!("status {}", marked));
        c.logger.flush_blocking().unwrap();
        let visible = String::from_utf8(strip_ansi_escapes::strip(c.stdout.bytes())).unwrap();
        assert!(visible.ends_with("status ok\n"));
    }

    #[test]
    fn test_render_console() {
        let c = capture(Logger::builder());
        let line = c.logger.child("api").render_console(
            LogLevel::Warn,
            "slow",
            &LogOptions::new().timestamp(false),
        );
        assert_eq!(line.plain_text(), "[WARN]    [api] slow");
        assert_eq!(line.styles[0], "color: #ffaa00");

        let line = c.logger.render_console(
            LogLevel::Error,
            ErrorReport::new("Error", "boom"),
            &LogOptions::new(),
        );
        assert!(line.plain_text().starts_with("Error: Error\nMessage: boom"));
        // Rendering does not touch the cache
        assert!(c.logger.error_stats().is_empty());
    }

    #[test]
    fn test_plugin_init_failure_is_reported() {
        struct BadInit;
        impl Plugin for BadInit {
            fn name(&self) -> &str {
                "bad-init"
            }
            fn init(&self, _logger: &Logger) -> Result<()> {
                Err(LoggerError::other("no config"))
            }
        }

        let c = capture(Logger::builder());
        c.logger.use_plugin(Arc::new(BadInit));
        assert_eq!(c.logger.plugin_names(), vec!["bad-init"]);
        assert!(c.diagnostics.lock()[0].contains("init"));
        assert!(c.logger.remove_plugin("bad-init"));
        assert!(!c.logger.remove_plugin("bad-init"));
    }

    #[test]
    fn test_child_gets_a_copy_of_plugins() {
        struct Named(&'static str);
        impl Plugin for Named {
            fn name(&self) -> &str {
                self.0
            }
        }

        let c = capture(Logger::builder());
        c.logger.use_plugin(Arc::new(Named("parent")));
        let child = c.logger.child("x");
        child.use_plugin(Arc::new(Named("child-only")));

        assert_eq!(c.logger.plugin_names(), vec!["parent"]);
        assert_eq!(child.plugin_names(), vec!["parent", "child-only"]);
    }

    #[test]
    fn test_enqueue_after_shutdown_is_reported() {
        let c = capture(Logger::builder().buffered(false));
        assert!(c.logger.shutdown(DEFAULT_SHUTDOWN_TIMEOUT));
        c.logger.info("too late");
        assert!(c.diagnostics.lock().iter().any(|d| d.contains("stopped")));
    }

    #[test]
    fn test_console_loggers_share_one_queue() {
        let first = Logger::new().unwrap();
        let second = Logger::builder().config(first.shared_config()).build().unwrap();
        let third = Logger::new().unwrap();

        assert!(Arc::ptr_eq(&first.output(), &second.output()));
        assert!(Arc::ptr_eq(&first.output(), &third.output()));
    }

    #[test]
    fn test_loggers_on_one_output_keep_call_order() {
        let a = capture(
            Logger::builder()
                .buffered(true)
                .queue_options(QueueOptions::new().max_latency(Duration::from_secs(600))),
        );
        let b = Logger::builder()
            .output(a.logger.output())
            .color_support(ColorSupport::None)
            .buffered(true)
            .build()
            .unwrap();

        // The buffered line from `a` must not be overtaken by `b`'s high-water-mark flush
        a.logger.info("first");
        for i in 0..10 {
            b.info(format!("b{}", i));
        }
        b.flush_blocking().unwrap();

        let lines: Vec<String> = a.stdout.lines().iter().map(|l| body(l).to_string()).collect();
        let mut expected = vec!["first".to_string()];
        expected.extend((0..10).map(|i| format!("b{}", i)));
        assert_eq!(lines, expected);
    }

    #[test]
    fn test_metrics_snapshot() {
        let c = capture(Logger::builder().buffered(false));
        c.logger.warn("w");
        c.logger.flush_blocking().unwrap();
        let metrics = c.logger.metrics(SinkKind::Elevated);
        assert_eq!(metrics.lines_written(), 1);
        assert_eq!(metrics.forced_flushes(), 1);
    }
}
