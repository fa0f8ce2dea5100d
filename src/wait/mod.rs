// Bounded condition waiting
//
// This module provides the ConditionWaiter which polls a caller-supplied
// probe at a fixed cadence until it is satisfied or a deadline elapses.
// It is the harness's replacement for ad-hoc sleep loops in tests: every
// wait is timeout-bounded and reports a descriptive reason on failure.

pub mod conditions;

use std::time::{Duration, Instant};
use thiserror::Error;

/// Poll cadence used when the caller does not override it.
///
/// The exact value is not load-bearing; it only trades probe frequency
/// against wait resolution.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Errors that can occur while waiting on a condition
#[derive(Error, Debug)]
pub enum WaitError {
    #[error("wait timeout must be positive, got {0:?}")]
    InvalidTimeout(Duration),

    #[error("timed out after {timeout:?} waiting until {description}")]
    TimedOut {
        description: String,
        timeout: Duration,
    },
}

/// A monotonic point in time derived from a duration at wait start.
///
/// Comparisons are based on [`Instant`], never wall-clock-of-day, so
/// clock adjustments during a test run cannot skew a running wait.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    end: Instant,
}

impl Deadline {
    /// Deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self {
            end: Instant::now() + timeout,
        }
    }

    /// Whether the deadline has passed.
    pub fn expired(&self) -> bool {
        Instant::now() >= self.end
    }

    /// Time left until the deadline, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.end.saturating_duration_since(Instant::now())
    }
}

/// Polls a boolean probe until it is satisfied or a deadline elapses.
///
/// The waiter itself is stateless apart from its poll interval; a wait is
/// constructed per call and discarded after resolution. Probes must be
/// deterministic under retry but carry no other contract — transient
/// lookup failures should be mapped to "not satisfied" (see
/// [`conditions::retryable`]) so that only timeout exhaustion is terminal.
///
/// # Example
/// ```ignore
/// let waiter = ConditionWaiter::new();
/// waiter.wait_until(
///     conditions::file_exists("/tmp/out.pdf"),
///     "signed output file exists",
///     Duration::from_secs(20),
/// )?;
/// ```
#[derive(Debug, Clone)]
pub struct ConditionWaiter {
    poll_interval: Duration,
}

impl ConditionWaiter {
    /// Create a waiter with the default poll interval.
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Create a waiter with a custom poll interval.
    ///
    /// A zero interval is clamped to 1ms so a failed poll is always
    /// followed by a bounded sleep rather than a busy spin.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    /// The configured poll interval.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Repeatedly invoke `probe` until it returns true or `timeout` elapses.
    ///
    /// Returns `Ok(())` immediately on the first satisfied poll (no
    /// trailing sleep). A probe that is already satisfied on entry never
    /// sleeps at all. On timeout the failure carries `description`, which
    /// should read as the condition being waited for ("OK button enabled",
    /// "output file exists").
    ///
    /// # Errors
    ///
    /// - [`WaitError::InvalidTimeout`] if `timeout` is zero; the probe is
    ///   not invoked in that case.
    /// - [`WaitError::TimedOut`] once `timeout` elapses without the probe
    ///   being satisfied. The loop terminates at or shortly after the
    ///   deadline regardless of probe latency: the final sleep is clamped
    ///   to the remaining time.
    pub fn wait_until<F>(
        &self,
        mut probe: F,
        description: &str,
        timeout: Duration,
    ) -> Result<(), WaitError>
    where
        F: FnMut() -> bool,
    {
        if timeout.is_zero() {
            return Err(WaitError::InvalidTimeout(timeout));
        }

        let started = Instant::now();
        let deadline = Deadline::after(timeout);

        loop {
            if probe() {
                tracing::debug!(
                    "condition \"{}\" satisfied after {:?}",
                    description,
                    started.elapsed()
                );
                return Ok(());
            }

            if deadline.expired() {
                tracing::warn!("condition \"{}\" not met within {:?}", description, timeout);
                return Err(WaitError::TimedOut {
                    description: description.to_string(),
                    timeout,
                });
            }

            std::thread::sleep(self.poll_interval.min(deadline.remaining()));
        }
    }
}

impl Default for ConditionWaiter {
    fn default() -> Self {
        Self::new()
    }
}
