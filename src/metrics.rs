// Harness metrics
//
// Lightweight counters over the harness's moving parts: waits, marshaled
// tasks, wake nudges, worker lifecycles. Collected with atomics so the
// worker and the test driver can both record without locks; dumped at
// teardown for post-run diagnosis of slow or flaky sessions.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct HarnessMetrics {
    /// Condition waits started
    pub waits_started: AtomicUsize,

    /// Condition waits that resolved satisfied
    pub waits_satisfied: AtomicUsize,

    /// Condition waits that exhausted their timeout
    pub waits_timed_out: AtomicUsize,

    /// Total time spent blocked in condition waits, in milliseconds
    pub total_wait_time_ms: AtomicU64,

    /// Closures marshaled onto the worker thread
    pub tasks_marshaled: AtomicU64,

    /// Marshal attempts rejected (queue full or worker gone)
    pub tasks_dropped: AtomicU64,

    /// Wake nudges issued during shutdown escalation
    pub wake_nudges: AtomicU64,

    /// Worker threads started
    pub workers_started: AtomicUsize,

    /// Worker threads that terminated cleanly
    pub workers_terminated: AtomicUsize,

    /// Worker threads abandoned still-alive at teardown
    pub workers_abandoned: AtomicUsize,

    /// Session start time
    start_time: Instant,
}

impl HarnessMetrics {
    pub fn new() -> Self {
        Self {
            waits_started: AtomicUsize::new(0),
            waits_satisfied: AtomicUsize::new(0),
            waits_timed_out: AtomicUsize::new(0),
            total_wait_time_ms: AtomicU64::new(0),
            tasks_marshaled: AtomicU64::new(0),
            tasks_dropped: AtomicU64::new(0),
            wake_nudges: AtomicU64::new(0),
            workers_started: AtomicUsize::new(0),
            workers_terminated: AtomicUsize::new(0),
            workers_abandoned: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_wait_started(&self) {
        self.waits_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_wait_satisfied(&self, blocked: Duration) {
        self.waits_satisfied.fetch_add(1, Ordering::Relaxed);
        self.total_wait_time_ms
            .fetch_add(blocked.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_wait_timed_out(&self, blocked: Duration) {
        self.waits_timed_out.fetch_add(1, Ordering::Relaxed);
        self.total_wait_time_ms
            .fetch_add(blocked.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_task_marshaled(&self) {
        self.tasks_marshaled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_dropped(&self) {
        self.tasks_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_wake_nudge(&self) {
        self.wake_nudges.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_worker_started(&self) {
        self.workers_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_worker_terminated(&self) {
        self.workers_terminated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_worker_abandoned(&self) {
        self.workers_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total session uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average time blocked per resolved wait, in milliseconds
    pub fn avg_wait_ms(&self) -> f64 {
        let total = self.total_wait_time_ms.load(Ordering::Relaxed);
        let count = self.waits_satisfied.load(Ordering::Relaxed)
            + self.waits_timed_out.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Harness Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Waits: {} started, {} satisfied, {} timed out (avg {:.2}ms blocked)",
            self.waits_started.load(Ordering::Relaxed),
            self.waits_satisfied.load(Ordering::Relaxed),
            self.waits_timed_out.load(Ordering::Relaxed),
            self.avg_wait_ms()
        );
        tracing::info!(
            "Worker tasks: {} marshaled, {} dropped; {} wake nudges",
            self.tasks_marshaled.load(Ordering::Relaxed),
            self.tasks_dropped.load(Ordering::Relaxed),
            self.wake_nudges.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Workers: {} started, {} terminated, {} abandoned",
            self.workers_started.load(Ordering::Relaxed),
            self.workers_terminated.load(Ordering::Relaxed),
            self.workers_abandoned.load(Ordering::Relaxed)
        );
    }
}

impl Default for HarnessMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = HarnessMetrics::new();
        assert_eq!(metrics.waits_started.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.workers_started.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_wait_counters_and_average() {
        let metrics = HarnessMetrics::new();

        metrics.record_wait_started();
        metrics.record_wait_satisfied(Duration::from_millis(100));
        metrics.record_wait_started();
        metrics.record_wait_timed_out(Duration::from_millis(300));

        assert_eq!(metrics.waits_satisfied.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.waits_timed_out.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.total_wait_time_ms.load(Ordering::Relaxed), 400);
        assert_eq!(metrics.avg_wait_ms(), 200.0);
    }

    #[test]
    fn test_avg_wait_without_waits() {
        let metrics = HarnessMetrics::new();
        assert_eq!(metrics.avg_wait_ms(), 0.0);
    }

    #[test]
    fn test_worker_counters() {
        let metrics = HarnessMetrics::new();

        metrics.record_worker_started();
        metrics.record_worker_terminated();
        metrics.record_worker_started();
        metrics.record_worker_abandoned();

        assert_eq!(metrics.workers_started.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.workers_terminated.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.workers_abandoned.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_uptime() {
        let metrics = HarnessMetrics::new();
        thread::sleep(Duration::from_millis(10));
        assert!(metrics.uptime().as_millis() >= 10);
    }
}
