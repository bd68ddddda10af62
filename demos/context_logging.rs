//! Context-bound logging
//!
//! Attaches a logger and request fields to a `Context`, hands the context
//! to nested work, and shows cancellation-aware logging.
//!
//! Run with: cargo run --example context_logging

use logger_facade::prelude::*;
use logger_facade::propagate_logging_state;
use std::sync::Arc;
use std::time::Duration;

fn handle_request(ctx: &Context, user: &str) {
    let ctx = ctx.with_fields([Field::string("user", user)]);
    let log = ctx.must_context_logger();
    log.info("Authorized", []);
    load_profile(&ctx);
}

fn load_profile(ctx: &Context) {
    let log = ctx.must_context_logger();
    log.debug("Loading profile", [Field::string("table", "profiles")]);
}

fn main() {
    println!("=== Logger Facade - Context Logging Example ===\n");

    let logger = Arc::new(Logger::new());
    logger.add_sink("stdout", std::io::stdout(), LogLevel::Debug, []);

    let root = Context::background()
        .with_logger(Arc::clone(&logger))
        .with_fields([Field::string("request_id", "req-7f3a")]);

    println!("1. Fields accumulate down the call chain:");
    handle_request(&root, "ada");

    println!("\n2. Background work keeps the logging identity, not the cancellation:");
    let (request_ctx, cancel_request) = root.with_cancel();
    let (worker_ctx, _cancel_worker) = Context::background().with_timeout(Duration::from_secs(30));
    let worker_ctx = propagate_logging_state(&worker_ctx, &request_ctx);
    cancel_request.cancel();

    let worker = std::thread::spawn(move || {
        let log = worker_ctx.must_context_logger();
        log.info_ignore_cancel(&worker_ctx, "Worker still logging", []);
    });
    let _ = worker.join();

    println!("\n3. Calls on a cancelled context are dropped:");
    let log = request_ctx.must_context_logger();
    log.error_ignore_cancel(&request_ctx, "Upstream closed (suppressed)", []);
    println!("   (nothing logged, reason: {:?})", request_ctx.err());

    println!("\n=== Example completed successfully! ===");
}
