//! Basic logger usage example
//!
//! Demonstrates the five levels, debug mode, scoped children, JSON payloads and colors.
//!
//! Run with: cargo run --example basic_usage

use serde_json::json;
use spectral_logger::prelude::*;

fn main() -> Result<()> {
    println!("=== Spectral Logger - Basic Usage Example ===\n");

    let logger = Logger::new()?;

    println!("1. Logging at different levels:");
    logger.log("This is a plain message");
    logger.info("This is an info message");
    logger.success("This is a success message");
    logger.warn("This is a warning (stderr)");
    logger.error("This is an error (stderr)");
    logger.debug("This debug message is hidden");
    logger.flush_blocking()?;

    println!("\n2. Debug mode:");
    logger.configure(ConfigOptions::new().debug_mode(true));
    logger.debug("Debug messages now show up");
    logger.flush_blocking()?;

    println!("\n3. Scoped children:");
    let db = logger.child("db");
    db.info("connected");
    db.child("pool").warn("pool exhausted, waiting");
    logger.flush_blocking()?;

    println!("\n4. Structured payloads:");
    logger.info(json!({"user": "ada", "roles": ["admin", "dev"]}));
    logger.flush_blocking()?;

    println!("\n5. Colors:");
    logger.add_color("brand", "#7c3aed")?;
    logger.info_with("Custom colored line", LogOptions::new().color("brand"));
    logger.log(format!(
        "Inline {} and {}",
        logger.markup("markers", "orange"),
        logger.markup("more markers", "rgb(0, 200, 120)")
    ));
    logger.configure(ConfigOptions::new().show_timestamp(false));
    logger.info("No timestamp on this one");
    logger.flush_blocking()?;

    println!("\n6. Errors are deduplicated:");
    for _ in 0..3 {
        logger.error(ErrorReport::new("TimeoutError", "upstream did not answer"));
    }
    logger.flush_blocking()?;
    for entry in logger.error_stats() {
        println!("   {}: {} occurrence(s)", entry.error.kind, entry.count);
    }

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
