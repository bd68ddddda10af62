//! File logging example
//!
//! Adds a rotating JSON file sink next to the console sink, loads sink
//! settings from JSON, and reports a writer failure through the built-ins.
//!
//! Run with: cargo run --example file_logging

use logger_facade::prelude::*;

fn main() -> Result<()> {
    println!("=== Logger Facade - File Logging Example ===\n");

    let logger = Logger::new();

    // Built-in sinks come from declarative settings
    let settings = LoggingSettings::from_json_str(
        r#"{
            "product_name_short": "file-logging",
            "console": { "enabled": true, "level": "debug" }
        }"#,
    )?;
    logger.apply_settings(&settings);

    // A second file with its own rotation policy
    let policy = RotationPolicy::new()
        .with_max_size(64 * 1024)
        .with_max_backups(3)
        .with_compression(true);
    logger.add_appender(
        "audit",
        Box::new(RotatingFileAppender::with_policy("audit.log", policy)),
        LogLevel::Info,
        [],
    );

    println!("1. Logging to console and audit.log:");
    logger.info("Application started", []);
    logger.debug("Loading configuration", [Field::string("path", "config.toml")]);
    logger.warn("Using default settings for some options", []);

    println!("\n2. Performing some operations:");
    for i in 1..=5u64 {
        logger.info("Processing item", [Field::uint("item", i), Field::uint("of", 5)]);
        if i == 3 {
            logger.warn("Item took longer than expected", [Field::uint("item", i)]);
        }
    }

    println!("\n3. Reporting a custom sink failure through the built-in sinks:");
    let err = std::io::Error::other("broken pipe");
    logger.error_in_sink_writer(format_args!("audit mirror failed: {}", err));

    let audit = logger.sink("audit").expect("audit sink was just added");
    println!(
        "\n   audit sink: {} written, {} filtered",
        audit.metrics().written_count(),
        audit.metrics().filtered_count()
    );

    logger.stop();
    println!("\n=== Example completed successfully! ===");
    println!("Check audit.log for the JSON records");

    Ok(())
}
