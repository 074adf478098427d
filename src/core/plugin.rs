//! Plugin hooks and the ordered pipeline that runs them

use super::diagnostics::{report, DiagnosticHandler};
use super::error::{panic_message, LoggerError, Result};
use super::log_record::LogRecord;
use super::logger::Logger;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// A named observer of log calls
///
/// Every hook is optional. Hooks run synchronously on the logging thread, so anything slow
/// should be handed off by the plugin itself.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Called once when the plugin is registered with `logger`
    fn init(&self, _logger: &Logger) -> Result<()> {
        Ok(())
    }

    /// Return `Some(text)` to replace the message seen by later plugins and the formatter
    fn before_log(&self, _message: &str, _record: &LogRecord<'_>) -> Result<Option<String>> {
        Ok(None)
    }

    /// Observe the message after it has been queued for output
    fn after_log(&self, _message: &str, _record: &LogRecord<'_>) -> Result<()> {
        Ok(())
    }
}

/// Plugins in registration order, unique by name
#[derive(Clone, Default)]
pub struct PluginPipeline {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `plugin`, replacing in place any plugin with the same name
    ///
    /// Returns `true` when an existing plugin was replaced.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> bool {
        match self.plugins.iter().position(|p| p.name() == plugin.name()) {
            Some(index) => {
                self.plugins[index] = plugin;
                true
            }
            None => {
                self.plugins.push(plugin);
                false
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Plugin>> {
        let index = self.plugins.iter().position(|p| p.name() == name)?;
        Some(self.plugins.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.iter().find(|p| p.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Left fold over the before hooks
    ///
    /// Empty replacements are ignored. A failing or panicking hook is reported and skipped;
    /// the message it received passes on unchanged.
    pub fn run_before(
        &self,
        message: String,
        record: &LogRecord<'_>,
        diagnostics: &DiagnosticHandler,
    ) -> String {
        let mut current = message;
        for plugin in &self.plugins {
            let result = catch_unwind(AssertUnwindSafe(|| plugin.before_log(&current, record)));
            match result {
                Ok(Ok(Some(replacement))) if !replacement.is_empty() => current = replacement,
                Ok(Ok(_)) => {}
                Ok(Err(e)) => report(
                    diagnostics,
                    &LoggerError::plugin(plugin.name(), "before_log", e.to_string()),
                ),
                Err(panic_info) => report(
                    diagnostics,
                    &LoggerError::plugin(
                        plugin.name(),
                        "before_log",
                        format!("panicked: {}", panic_message(panic_info.as_ref())),
                    ),
                ),
            }
        }
        current
    }

    /// Run every after hook for its side effects
    pub fn run_after(&self, message: &str, record: &LogRecord<'_>, diagnostics: &DiagnosticHandler) {
        for plugin in &self.plugins {
            let result = catch_unwind(AssertUnwindSafe(|| plugin.after_log(message, record)));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => report(
                    diagnostics,
                    &LoggerError::plugin(plugin.name(), "after_log", e.to_string()),
                ),
                Err(panic_info) => report(
                    diagnostics,
                    &LoggerError::plugin(
                        plugin.name(),
                        "after_log",
                        format!("panicked: {}", panic_message(panic_info.as_ref())),
                    ),
                ),
            }
        }
    }
}

impl std::fmt::Debug for PluginPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.plugins.iter().map(|p| p.name())).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::LogLevel;
    use crate::core::log_record::{LogOptions, Payload};
    use parking_lot::Mutex;

    struct Rewrite {
        name: &'static str,
        f: fn(&str) -> Option<String>,
    }

    impl Plugin for Rewrite {
        fn name(&self) -> &str {
            self.name
        }

        fn before_log(&self, message: &str, _record: &LogRecord<'_>) -> Result<Option<String>> {
            Ok((self.f)(message))
        }
    }

    struct Failing;

    impl Plugin for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn before_log(&self, _message: &str, _record: &LogRecord<'_>) -> Result<Option<String>> {
            Err(LoggerError::other("nope"))
        }

        fn after_log(&self, _message: &str, _record: &LogRecord<'_>) -> Result<()> {
            panic!("after hook blew up");
        }
    }

    struct Recorder(Mutex<Vec<String>>);

    impl Plugin for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn after_log(&self, message: &str, record: &LogRecord<'_>) -> Result<()> {
            self.0.lock().push(format!("{}:{}", record.level, message));
            Ok(())
        }
    }

    fn collecting() -> (DiagnosticHandler, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: DiagnosticHandler = Arc::new(move |e: &LoggerError| sink.lock().push(e.to_string()));
        (handler, seen)
    }

    fn with_record<R>(f: impl FnOnce(&LogRecord<'_>) -> R) -> R {
        let payload = Payload::from("msg");
        let options = LogOptions::new();
        f(&LogRecord::new(LogLevel::Info, &payload, &options, None))
    }

    #[test]
    fn test_before_hooks_fold_in_order() {
        let mut pipeline = PluginPipeline::new();
        pipeline.register(Arc::new(Rewrite {
            name: "upper",
            f: |m| Some(m.to_uppercase()),
        }));
        pipeline.register(Arc::new(Rewrite {
            name: "bang",
            f: |m| Some(format!("{}!", m)),
        }));
        pipeline.register(Arc::new(Rewrite {
            name: "quiet",
            f: |_| None,
        }));

        let (diagnostics, _) = collecting();
        let out = with_record(|record| pipeline.run_before("hi".to_string(), record, &diagnostics));
        assert_eq!(out, "HI!");
    }

    #[test]
    fn test_empty_replacement_is_ignored() {
        let mut pipeline = PluginPipeline::new();
        pipeline.register(Arc::new(Rewrite {
            name: "blank",
            f: |_| Some(String::new()),
        }));

        let (diagnostics, _) = collecting();
        let out = with_record(|record| pipeline.run_before("keep".to_string(), record, &diagnostics));
        assert_eq!(out, "keep");
    }

    #[test]
    fn test_register_same_name_replaces_in_place() {
        let mut pipeline = PluginPipeline::new();
        pipeline.register(Arc::new(Rewrite { name: "a", f: |_| None }));
        pipeline.register(Arc::new(Rewrite { name: "b", f: |_| None }));
        let replaced = pipeline.register(Arc::new(Rewrite {
            name: "a",
            f: |_| Some("from new a".to_string()),
        }));

        assert!(replaced);
        assert_eq!(pipeline.names(), vec!["a", "b"]);

        let (diagnostics, _) = collecting();
        let out = with_record(|record| pipeline.run_before("x".to_string(), record, &diagnostics));
        assert_eq!(out, "from new a");
    }

    #[test]
    fn test_remove() {
        let mut pipeline = PluginPipeline::new();
        pipeline.register(Arc::new(Rewrite { name: "a", f: |_| None }));
        assert!(pipeline.remove("a").is_some());
        assert!(pipeline.remove("a").is_none());
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_failures_are_reported_not_propagated() {
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let mut pipeline = PluginPipeline::new();
        pipeline.register(Arc::new(Failing));
        pipeline.register(Arc::clone(&recorder) as Arc<dyn Plugin>);

        let (diagnostics, seen) = collecting();
        with_record(|record| {
            let out = pipeline.run_before("m".to_string(), record, &diagnostics);
            assert_eq!(out, "m");
            pipeline.run_after(&out, record, &diagnostics);
        });

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].contains("before_log"));
        assert!(seen[1].contains("after hook blew up"));
        // Later plugins still ran
        assert_eq!(recorder.0.lock().as_slice(), ["info:m"]);
    }
}
