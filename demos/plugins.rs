//! Plugin example
//!
//! Demonstrates a rewriting plugin, an observing plugin and the bundled performance tracker.
//!
//! Run with: cargo run --example plugins

use parking_lot::Mutex;
use spectral_logger::plugins::PerformanceTracker;
use spectral_logger::prelude::*;
use std::sync::Arc;

/// Masks anything that looks like a password assignment
struct Redactor;

impl Plugin for Redactor {
    fn name(&self) -> &str {
        "redactor"
    }

    fn before_log(&self, message: &str, _record: &LogRecord<'_>) -> Result<Option<String>> {
        let Some(start) = message.find("password=") else {
            return Ok(None);
        };
        let value_start = start + "password=".len();
        let value_end = message[value_start..]
            .find(char::is_whitespace)
            .map_or(message.len(), |i| value_start + i);
        Ok(Some(format!(
            "{}***{}",
            &message[..value_start],
            &message[value_end..]
        )))
    }
}

/// Remembers every warning and error that went out
#[derive(Default)]
struct Alerts {
    seen: Mutex<Vec<String>>,
}

impl Plugin for Alerts {
    fn name(&self) -> &str {
        "alerts"
    }

    fn after_log(&self, message: &str, record: &LogRecord<'_>) -> Result<()> {
        if record.level.sink() == SinkKind::Elevated {
            self.seen.lock().push(message.to_string());
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    println!("=== Spectral Logger - Plugins Example ===\n");

    let tracker = Arc::new(PerformanceTracker::new());
    let alerts = Arc::new(Alerts::default());

    let logger = Logger::builder()
        .plugin(Arc::new(Redactor))
        .plugin(alerts.clone())
        .plugin(tracker.clone())
        .build()?;
    println!("Registered plugins: {:?}\n", logger.plugin_names());

    logger.info("login user=ada password=hunter2 from 10.0.0.7");
    logger.child("auth").warn("3 failed attempts for user=bob");
    logger.error("password=letmein rejected");
    for i in 0..50 {
        logger.log(format!("request {} served", i));
    }
    logger.flush_blocking()?;

    println!("\nAlerts captured by plugin:");
    for alert in alerts.seen.lock().iter() {
        println!("   {}", alert);
    }

    println!("\n{}", tracker.report());

    logger.remove_plugin("redactor");
    logger.info("password=visible once the redactor is removed");
    logger.flush_blocking()?;

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
