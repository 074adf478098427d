//! Diagnostic channel for the logger's own failures
//!
//! Rejected configuration, plugin failures and sink write errors never surface from a logging
//! call. They are handed to a [`DiagnosticHandler`] instead, which by default writes straight to
//! the process stderr handle and never goes through the output queue.

use super::error::LoggerError;
use std::io::Write;
use std::sync::Arc;

/// Receives every internal failure
pub type DiagnosticHandler = Arc<dyn Fn(&LoggerError) + Send + Sync>;

/// Prefix of diagnostic lines written by [`stderr_handler`]
pub const DIAGNOSTIC_PREFIX: &str = "[SPECTRAL ERROR]";

/// Default handler: one line per failure on stderr, write errors ignored
pub fn stderr_handler() -> DiagnosticHandler {
    Arc::new(|error: &LoggerError| {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{} {}", DIAGNOSTIC_PREFIX, error);
    })
}

/// Handler that drops everything
pub fn silent_handler() -> DiagnosticHandler {
    Arc::new(|_: &LoggerError| {})
}

/// Invoke `handler`, containing any panic it raises
pub(crate) fn report(handler: &DiagnosticHandler, error: &LoggerError) {
    let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(error)));
}
