//! Integration tests for the condition waiter against real filesystem
//! state changed by concurrent actors
//!
//! These tests verify:
//! - Waits resolve shortly after the condition becomes true, not at the
//!   timeout
//! - Timeouts fire at (not before) the deadline and stay bounded
//! - Transient probe failures are retried rather than fatal

use camino::Utf8PathBuf;
use regex::Regex;
use std::fs;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use uiharness::wait::{ConditionWaiter, WaitError, conditions};

fn create_output_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, path)
}

fn fast_waiter() -> ConditionWaiter {
    ConditionWaiter::with_poll_interval(Duration::from_millis(20))
}

#[test]
fn test_wait_resolves_when_concurrent_actor_creates_file() {
    let (_temp_dir, dir) = create_output_dir();
    let output = dir.join("TestFile_superSigned.pdf");

    // Scaled-down version of the signing flow: the application writes the
    // output ~300ms after the wait begins, with a far larger timeout.
    let writer = {
        let output = output.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            fs::write(&output, b"%PDF-1.7 signed").unwrap();
        })
    };

    let started = Instant::now();
    fast_waiter()
        .wait_until(
            conditions::file_exists(&output),
            "signed output file exists",
            Duration::from_secs(20),
        )
        .unwrap();
    let elapsed = started.elapsed();

    // Resolved around the creation time, nowhere near the 20s timeout
    assert!(elapsed >= Duration::from_millis(250), "resolved early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "resolved late: {elapsed:?}");

    writer.join().unwrap();
}

#[test]
fn test_wait_times_out_when_file_never_appears() {
    let (_temp_dir, dir) = create_output_dir();
    let output = dir.join("never.pdf");

    let timeout = Duration::from_millis(200);
    let started = Instant::now();

    let result = fast_waiter().wait_until(
        conditions::file_exists(&output),
        "output file exists",
        timeout,
    );
    let elapsed = started.elapsed();

    match result {
        Err(WaitError::TimedOut { description, .. }) => {
            assert_eq!(description, "output file exists");
        }
        other => panic!("expected TimedOut, got {other:?}"),
    }

    // Never earlier than the deadline, never unboundedly later
    assert!(elapsed >= timeout, "timed out early: {elapsed:?}");
    assert!(elapsed < timeout + Duration::from_secs(1), "timed out late: {elapsed:?}");
}

#[test]
fn test_zero_timeout_rejected_before_touching_the_filesystem() {
    let result = fast_waiter().wait_until(
        || panic!("probe must not run"),
        "anything",
        Duration::ZERO,
    );

    assert!(matches!(result, Err(WaitError::InvalidTimeout(_))));
}

#[test]
fn test_wait_on_log_line_appearing() {
    let (_temp_dir, dir) = create_output_dir();
    let log = dir.join("app.log");
    fs::write(&log, "booting\n").unwrap();

    let writer = {
        let log = log.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            fs::write(&log, "booting\nsignature complete\n").unwrap();
        })
    };

    fast_waiter()
        .wait_until(
            conditions::file_contains(&log, Regex::new("signature complete").unwrap()),
            "signature logged",
            Duration::from_secs(10),
        )
        .unwrap();

    writer.join().unwrap();
}

#[test]
fn test_transient_probe_errors_are_retried() {
    let (_temp_dir, dir) = create_output_dir();
    let target = dir.join("widget.state");

    let writer = {
        let target = target.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            fs::write(&target, "enabled").unwrap();
        })
    };

    // Reading a file that does not exist yet is the transient case:
    // mapped to "not satisfied", never fatal.
    fast_waiter()
        .wait_until(
            conditions::retryable(|| -> std::io::Result<bool> {
                Ok(fs::read_to_string(&target)? == "enabled")
            }),
            "widget enabled",
            Duration::from_secs(10),
        )
        .unwrap();

    writer.join().unwrap();
}
