//! Process-exit behaviour of fatal records
//!
//! `fatal` ends the process, so each scenario runs in a child copy of this
//! test binary. The child is selected with `--exact <test name>` and told
//! which scenario to run through an environment variable; the parent
//! asserts on the exit status and stdout.

use logger_facade::{Field, LogLevel, Logger};
use std::io::Write;
use std::process::{Command, Output};

const SCENARIO_VAR: &str = "LOGGER_FACADE_FATAL_SCENARIO";

fn run_child(test_name: &str, scenario: &str) -> Output {
    let exe = std::env::current_exe().expect("Failed to locate test binary");
    Command::new(exe)
        .args(["--exact", test_name, "--nocapture", "--test-threads=1"])
        .env(SCENARIO_VAR, scenario)
        .output()
        .expect("Failed to spawn child test process")
}

fn scenario() -> Option<String> {
    std::env::var(SCENARIO_VAR).ok()
}

struct StdoutSink;

impl Write for StdoutSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        std::io::stdout().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stdout().flush()
    }
}

#[test]
fn test_fatal_without_sinks_prints_and_exits() {
    if scenario().as_deref() == Some("no-sinks") {
        let logger = Logger::new();
        logger.fatal("fatal with nobody listening", [Field::int("code", 9)]);
    }

    let output = run_child("test_fatal_without_sinks_prints_and_exits", "no-sinks");
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fatal with nobody listening"));
}

#[test]
fn test_fatal_with_sink_logs_then_exits() {
    if scenario().as_deref() == Some("with-sink") {
        let logger = Logger::new();
        logger.add_sink("stdout", StdoutSink, LogLevel::Info, []);
        logger.fatal("fatal through a sink", []);
    }

    let output = run_child("test_fatal_with_sink_logs_then_exits", "with-sink");
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    // the harness may have printed the test name on the same line
    let record = stdout
        .lines()
        .find_map(|line| line.find("{\"level\"").map(|start| &line[start..]))
        .expect("no JSON record in child output");
    let parsed: serde_json::Value = serde_json::from_str(record).expect("invalid JSON record");
    assert_eq!(parsed["level"], "fatal");
    assert_eq!(parsed["msg"], "fatal through a sink");
}

#[test]
fn test_fatal_with_disabled_sink_uses_fallback() {
    if scenario().as_deref() == Some("disabled-sink") {
        let logger = Logger::new();
        logger.add_sink("stdout", StdoutSink, LogLevel::Info, []);
        logger.set_sink_enabled("stdout", false);
        logger.fatal("fallback after disable", []);
    }

    let output = run_child("test_fatal_with_disabled_sink_uses_fallback", "disabled-sink");
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fallback after disable"));
}
