//! Buffered output example
//!
//! Demonstrates adaptive buffering, awaitable flushes from async tasks and graceful shutdown.
//!
//! Run with: cargo run --example buffered_output --features async

use spectral_logger::prelude::*;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Spectral Logger - Buffered Output Example ===\n");

    let logger = Logger::builder()
        .buffered(true)
        .queue_options(
            QueueOptions::new()
                .high_water_mark(32)
                .max_latency(Duration::from_millis(50)),
        )
        .build()?;

    println!("1. Logging from concurrent tasks:");
    let start = Instant::now();
    let mut handles = Vec::new();
    for task in 0..4 {
        let worker = logger.child(format!("task-{}", task));
        handles.push(tokio::spawn(async move {
            for i in 0..25 {
                worker.info(format!("step {}", i));
                if i % 10 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        }));
    }
    for handle in handles {
        if let Err(e) = handle.await {
            eprintln!("task failed: {}", e);
        }
    }
    let enqueued = start.elapsed();

    logger.flush_async().await?;
    println!(
        "\n   100 lines enqueued in {:?}, all written after {:?}",
        enqueued,
        start.elapsed()
    );

    let metrics = logger.metrics(SinkKind::Normal);
    println!(
        "   written: {}, immediate flushes: {}, scheduled flushes: {}",
        metrics.lines_written(),
        metrics.immediate_flushes(),
        metrics.scheduled_flushes()
    );

    println!("\n2. A single line waits for the adaptive delay:");
    logger.success("flushed by the timer");
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("\n3. Graceful shutdown drains what is left:");
    for i in 0..5 {
        logger.log(format!("pending line {}", i));
    }
    let drained = logger.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    println!("   drained cleanly: {}", drained);

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
