// Test session
//
// The per-test orchestrator exposed to suites: boots the hosted loop with
// configured timeouts, offers bounded waits on application-visible state,
// marshals actions onto the worker thread, and tears everything down with
// the grace-then-force escalation. One TestSession per test execution.

use crate::lifecycle::{ShutdownOutcome, StartupError, UiThreadLifecycle};
use crate::loop_host::{BridgeError, HostedLoop};
use crate::metrics::HarnessMetrics;
use crate::models::{HarnessSettings, ProfileRotation, SignatureProfile};
use crate::wait::{ConditionWaiter, WaitError, conditions};
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A running harness session around one application-under-test instance.
///
/// # Example
/// ```ignore
/// let settings = ConfigManager::new("Harness Data")?.load_settings()?;
/// let session = TestSession::start(
///     settings,
///     || SwtLoop::new(),
///     |hosted| hosted.boot_application(&input_pdf),
///     |hosted| hosted.close_main_window(),
/// )?;
///
/// session.run_on_worker_sync(|hosted| hosted.submit_credentials(user, pass))??;
/// session.wait_for_file(&signed_pdf)?;
/// session.stop_and_join();
/// ```
pub struct TestSession<L: HostedLoop + 'static> {
    lifecycle: UiThreadLifecycle<L>,
    waiter: ConditionWaiter,
    settings: HarnessSettings,
    metrics: Arc<HarnessMetrics>,
    profiles: Mutex<ProfileRotation>,
}

impl<L: HostedLoop + 'static> TestSession<L> {
    /// Boot the application under test and block until it is ready.
    ///
    /// Startup is bounded by the settings' startup timeout; failures from
    /// the adapter factory, root-handle creation or `init` are re-raised
    /// here (see [`UiThreadLifecycle::start`]).
    pub fn start<F, I, X>(
        settings: HarnessSettings,
        factory: F,
        init: I,
        on_exit: X,
    ) -> Result<Self, StartupError>
    where
        F: FnOnce() -> anyhow::Result<L> + Send + 'static,
        I: FnOnce(&mut L) -> anyhow::Result<()> + Send + 'static,
        X: FnOnce(&mut L) + Send + 'static,
    {
        let metrics = Arc::new(HarnessMetrics::new());
        metrics.record_worker_started();

        let mut lifecycle =
            UiThreadLifecycle::start(factory, init, on_exit, settings.startup_timeout())?;
        lifecycle.set_metrics(Arc::clone(&metrics));

        Ok(Self {
            lifecycle,
            waiter: ConditionWaiter::with_poll_interval(settings.poll_interval()),
            settings,
            metrics,
            profiles: Mutex::new(ProfileRotation::new()),
        })
    }

    /// Poll `probe` until satisfied or `timeout` elapses (see
    /// [`ConditionWaiter::wait_until`]). Wait outcomes are recorded in the
    /// session metrics.
    pub fn wait_until<F>(
        &self,
        probe: F,
        description: &str,
        timeout: Duration,
    ) -> Result<(), WaitError>
    where
        F: FnMut() -> bool,
    {
        self.metrics.record_wait_started();
        let started = Instant::now();

        match self.waiter.wait_until(probe, description, timeout) {
            Ok(()) => {
                self.metrics.record_wait_satisfied(started.elapsed());
                Ok(())
            }
            Err(e @ WaitError::TimedOut { .. }) => {
                self.metrics.record_wait_timed_out(started.elapsed());
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Wait for `path` to appear, bounded by the configured output timeout.
    ///
    /// The canonical post-action wait: the application writes its signed
    /// output asynchronously and the test blocks here until it lands.
    pub fn wait_for_file(&self, path: impl AsRef<Utf8Path>) -> Result<(), WaitError> {
        let path = path.as_ref();
        self.wait_until(
            conditions::file_exists(path),
            &format!("output file {path} exists"),
            self.settings.output_timeout(),
        )
    }

    /// Queue a closure on the worker thread and continue.
    pub fn run_on_worker<F>(&self, f: F) -> Result<(), BridgeError>
    where
        F: FnOnce(&mut L) + Send + 'static,
    {
        self.record_marshal(self.lifecycle.run_on_worker(f))
    }

    /// Run a closure on the worker thread and block for its result.
    pub fn run_on_worker_sync<F, R>(&self, f: F) -> Result<R, BridgeError>
    where
        F: FnOnce(&mut L) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.record_marshal(self.lifecycle.run_on_worker_sync(f))
    }

    /// Ask the hosted loop to wind down gracefully. Idempotent.
    pub fn request_exit(&self) {
        self.lifecycle.request_exit();
    }

    /// Tear the session down: graceful exit, grace-then-force escalation,
    /// unconditional release. Logs the metrics summary and returns the
    /// shutdown outcome ([`ShutdownOutcome::StillAlive`] is soft: the
    /// worker was abandoned but the test may still pass).
    pub fn stop_and_join(mut self) -> ShutdownOutcome {
        let outcome = self
            .lifecycle
            .stop_and_join(self.settings.grace_period(), self.settings.force_period());

        match outcome {
            ShutdownOutcome::Terminated => self.metrics.record_worker_terminated(),
            ShutdownOutcome::StillAlive => self.metrics.record_worker_abandoned(),
        }

        self.metrics.log_summary();
        outcome
    }

    /// The signature profile for this run; cycles round-robin across runs.
    pub fn next_profile(&self) -> SignatureProfile {
        self.profiles.lock().unwrap().next_profile()
    }

    /// Path where the application will write the signed counterpart of
    /// `input`, using the configured postfix: `<dir>/<stem><postfix>.<ext>`.
    pub fn signed_output_path(
        &self,
        input: impl AsRef<Utf8Path>,
        output_dir: impl AsRef<Utf8Path>,
    ) -> Utf8PathBuf {
        signed_output_path(input, output_dir, &self.settings.harness.output_postfix)
    }

    /// Session metrics, shared with the lifecycle.
    pub fn metrics(&self) -> Arc<HarnessMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Settings this session was started with.
    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    fn record_marshal<T>(&self, result: Result<T, BridgeError>) -> Result<T, BridgeError> {
        match &result {
            Ok(_) => self.metrics.record_task_marshaled(),
            Err(_) => self.metrics.record_task_dropped(),
        }
        result
    }
}

/// Derive the signed-output path for `input` inside `output_dir`.
///
/// `TestFile.pdf` with postfix `_superSigned` becomes
/// `<output_dir>/TestFile_superSigned.pdf`. Inputs without an extension
/// keep none.
pub fn signed_output_path(
    input: impl AsRef<Utf8Path>,
    output_dir: impl AsRef<Utf8Path>,
    postfix: &str,
) -> Utf8PathBuf {
    let input = input.as_ref();
    let stem = input.file_stem().unwrap_or_else(|| input.as_str());

    let file_name = match input.extension() {
        Some(ext) => format!("{stem}{postfix}.{ext}"),
        None => format!("{stem}{postfix}"),
    };

    output_dir.as_ref().join(file_name)
}
