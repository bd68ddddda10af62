//! Basic facade usage
//!
//! Starts the built-in sinks, turns on the console and JSON stdout sinks and
//! logs at different levels.
//!
//! Run with: cargo run --example basic_usage

use logger_facade::prelude::*;
use logger_facade::{info, warn};

fn main() {
    println!("=== Logger Facade - Basic Usage Example ===\n");

    let logger = Logger::new();
    logger.start([with_product_name_short("basic-usage")]);

    println!("1. Console sink at its default level (INFO):");
    logger.set_console_logging(true);
    logger.debug("Debug message (hidden)", []);
    logger.info("Service ready", [Field::uint("port", 8080)]);
    logger.warn("Cache miss rate high", [Field::float("ratio", 0.42)]);

    println!("\n2. Lowering the console level at runtime:");
    logger.set_console_log_level(LogLevel::Debug);
    logger.debug("Debug message (visible)", [Field::string("component", "cache")]);

    println!("\n3. JSON stdout alongside the console, via macros:");
    logger.set_json_stdout_logging(true);
    info!(logger, "Request served", "path" => "/health", "status" => 200);
    warn!(logger, "Slow request", "path" => "/search", "elapsed_ms" => 1250);

    println!("\n4. Checking before building expensive fields:");
    if logger.is_level_enabled(LogLevel::Debug) {
        logger.debug("Expensive diagnostics", [Field::any("snapshot", &vec![1, 2, 3])]);
    }

    logger.stop();
    println!("\n=== Example completed successfully! ===");
}
