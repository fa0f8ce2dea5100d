// UI thread lifecycle
//
// Owns the dedicated worker thread that runs a hosted (foreign-toolkit)
// event loop. Coordinates the two handoffs that make UI tests hang when
// they go wrong: startup (wait for readiness, re-raise init failures on
// the caller) and shutdown (graceful exit request, then a wake nudge, then
// bounded abandonment). The worker owns the adapter and its root handle
// exclusively; the caller reaches it only through marshaled closures.

pub mod latch;

pub use latch::Latch;

use crate::loop_host::{BridgeError, HostedLoop, LoopWaker, WorkerBridge, WorkerTask};
use crate::metrics::HarnessMetrics;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Worker thread name, visible in logs and debuggers.
const WORKER_THREAD_NAME: &str = "uiharness-loop";

/// Lifecycle progression of the worker thread.
///
/// ```text
/// NotStarted -> Starting -> Ready -> Running -> ExitRequested -> Terminated
///                  |
///                  +-> StartupFailed (terminal)
/// ```
///
/// `NotStarted`, `Starting` and `Ready` are the phases inside
/// [`UiThreadLifecycle::start`]; once it returns, [`state()`](UiThreadLifecycle::state)
/// reports `Running`, `ExitRequested` or `Terminated`. `StartupFailed` is
/// only ever surfaced as the error return of `start` — no lifecycle value
/// exists in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    Starting,
    Ready,
    Running,
    ExitRequested,
    Terminated,
    StartupFailed,
}

/// Errors surfaced synchronously by [`UiThreadLifecycle::start`]
#[derive(Error, Debug)]
pub enum StartupError {
    /// Readiness was never signaled in time. The worker thread is left
    /// running; it may still be initializing and remains responsible for
    /// disposing its own handle on whatever exit path it eventually takes.
    #[error("hosted loop not ready within {0:?}")]
    StartupTimeout(Duration),

    /// Adapter construction, root-handle creation, or init failed (or
    /// panicked) before readiness was signaled.
    #[error("hosted loop startup failed")]
    StartupFailed(#[source] anyhow::Error),

    #[error("failed to spawn worker thread")]
    Spawn(#[from] std::io::Error),
}

/// Result of [`UiThreadLifecycle::stop_and_join`].
///
/// `StillAlive` is a soft failure: it is logged and the caller's resources
/// are released regardless, but nothing is raised. The worker keeps
/// ownership of its handle and disposes it if it ever unblocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    Terminated,
    StillAlive,
}

/// Coordinator for one worker thread hosting a foreign event loop.
///
/// # Example
/// ```ignore
/// let lifecycle = UiThreadLifecycle::start(
///     || SwtLoop::new(),                       // adapter, built on the worker
///     |hosted| hosted.boot_application(args),  // init, before readiness
///     |hosted| hosted.close_main_window(),     // graceful-exit callback
///     Duration::from_secs(30),
/// )?;
/// lifecycle.run_on_worker_sync(|hosted| hosted.click("OK"))??;
/// lifecycle.stop_and_join(Duration::from_secs(10), Duration::from_secs(3));
/// ```
pub struct UiThreadLifecycle<L: HostedLoop + 'static> {
    bridge: WorkerBridge<L>,

    /// Graceful-exit callback, consumed by the first `request_exit`
    on_exit: Mutex<Option<WorkerTask<L>>>,

    /// Set by the caller exactly once; makes `request_exit` idempotent
    exit_requested: AtomicBool,

    /// Opened by the worker on every exit path, including panics
    done: Arc<Latch<()>>,

    join_handle: Option<JoinHandle<()>>,

    /// Optional observer for shutdown-escalation events
    metrics: Option<Arc<HarnessMetrics>>,
}

impl<L: HostedLoop + 'static> UiThreadLifecycle<L> {
    /// Spawn the worker thread and block until it is ready (or fails).
    ///
    /// The worker runs, in order: `factory` (adapter construction),
    /// [`HostedLoop::create_root`], `init` (application boot, panics
    /// captured), readiness signaling, then the event loop. Readiness is
    /// signaled strictly after the root handle is fully constructed and
    /// before the loop starts, so anything done after `start` returns may
    /// assume the handle exists and is usable.
    ///
    /// `on_exit` is the graceful-exit callback: it runs on the worker
    /// thread when [`request_exit`](Self::request_exit) is first called,
    /// and is expected to make the hosted loop wind down (close the main
    /// window, stop the application's state machine).
    ///
    /// # Errors
    ///
    /// - [`StartupError::StartupFailed`] if `factory`, `create_root` or
    ///   `init` failed or panicked before readiness; the cause is the
    ///   worker's error, re-raised synchronously here. The worker disposes
    ///   the root handle before exiting.
    /// - [`StartupError::StartupTimeout`] if readiness was not signaled
    ///   within `startup_timeout`. The worker is abandoned, still running.
    pub fn start<F, I, X>(
        factory: F,
        init: I,
        on_exit: X,
        startup_timeout: Duration,
    ) -> Result<Self, StartupError>
    where
        F: FnOnce() -> anyhow::Result<L> + Send + 'static,
        I: FnOnce(&mut L) -> anyhow::Result<()> + Send + 'static,
        X: FnOnce(&mut L) + Send + 'static,
    {
        let (task_tx, task_rx) = WorkerBridge::<L>::channel();
        let ready: Arc<Latch<Result<LoopWaker, anyhow::Error>>> = Arc::new(Latch::new());
        let done: Arc<Latch<()>> = Arc::new(Latch::new());

        let ready_worker = Arc::clone(&ready);
        let done_worker = Arc::clone(&done);
        let join_handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker_main(factory, init, task_rx, ready_worker, done_worker))?;

        match ready.take(startup_timeout) {
            Some(Ok(waker)) => {
                tracing::info!("hosted loop ready");
                Ok(Self {
                    bridge: WorkerBridge::new(task_tx, waker),
                    on_exit: Mutex::new(Some(Box::new(on_exit))),
                    exit_requested: AtomicBool::new(false),
                    done,
                    join_handle: Some(join_handle),
                    metrics: None,
                })
            }
            Some(Err(cause)) => {
                // The worker is already on its way out; reap the thread so
                // a failed startup does not leak it.
                let _ = join_handle.join();
                tracing::error!("hosted loop startup failed: {:#}", cause);
                Err(StartupError::StartupFailed(cause))
            }
            None => {
                tracing::error!(
                    "hosted loop not ready within {:?}, abandoning worker thread",
                    startup_timeout
                );
                Err(StartupError::StartupTimeout(startup_timeout))
            }
        }
    }

    /// Attach a metrics sink that records shutdown-escalation events.
    pub fn set_metrics(&mut self, metrics: Arc<HarnessMetrics>) {
        self.metrics = Some(metrics);
    }

    /// Observable lifecycle state (see [`LifecycleState`]).
    pub fn state(&self) -> LifecycleState {
        if self.done.is_open() {
            LifecycleState::Terminated
        } else if self.exit_requested.load(Ordering::SeqCst) {
            LifecycleState::ExitRequested
        } else {
            LifecycleState::Running
        }
    }

    /// Ask the hosted loop to wind down gracefully.
    ///
    /// Marshals the graceful-exit callback onto the worker thread (it
    /// never runs on the caller) and nudges the loop so a sleeping worker
    /// picks it up. Idempotent: second and later calls, and calls after
    /// termination, are no-ops.
    pub fn request_exit(&self) {
        if self.exit_requested.swap(true, Ordering::SeqCst) {
            return;
        }

        let Some(task) = self.on_exit.lock().unwrap().take() else {
            return;
        };

        tracing::info!("requesting hosted loop exit");
        match self.bridge.run_on_worker(task) {
            Ok(()) => self.bridge.waker().wake(),
            Err(BridgeError::WorkerGone) => {
                tracing::debug!("exit requested after worker already terminated");
            }
            Err(e) => tracing::warn!("could not deliver exit request: {}", e),
        }
    }

    /// Stop the worker: graceful request, bounded wait, one wake nudge,
    /// bounded wait again, then abandonment.
    ///
    /// Returns [`ShutdownOutcome::Terminated`] if the worker exited within
    /// `grace` (or within `force` after the nudge), joining the thread.
    /// Returns [`ShutdownOutcome::StillAlive`] otherwise — logged, never
    /// raised. Caller-owned resources (the exit callback, the join handle)
    /// are released on both paths; handle disposal belongs to the worker
    /// and has either already run or will run if the thread ever unblocks.
    pub fn stop_and_join(&mut self, grace: Duration, force: Duration) -> ShutdownOutcome {
        self.request_exit();

        if !self.done.wait_opened(grace) {
            tracing::warn!(
                "worker did not terminate within {:?}, nudging event loop",
                grace
            );
            self.bridge.waker().wake();
            if let Some(metrics) = &self.metrics {
                metrics.record_wake_nudge();
            }

            if !self.done.wait_opened(force) {
                tracing::error!(
                    "worker still alive {:?} after exit request, abandoning",
                    grace + force
                );
                self.release();
                return ShutdownOutcome::StillAlive;
            }
        }

        tracing::info!("worker terminated gracefully");
        self.release();
        ShutdownOutcome::Terminated
    }

    /// Queue a closure on the worker thread and continue (see
    /// [`WorkerBridge::run_on_worker`]).
    pub fn run_on_worker<F>(&self, f: F) -> Result<(), BridgeError>
    where
        F: FnOnce(&mut L) + Send + 'static,
    {
        self.bridge.run_on_worker(f)
    }

    /// Run a closure on the worker thread and block for its result (see
    /// [`WorkerBridge::run_on_worker_sync`]).
    pub fn run_on_worker_sync<F, R>(&self, f: F) -> Result<R, BridgeError>
    where
        F: FnOnce(&mut L) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.bridge.run_on_worker_sync(f)
    }

    /// Caller-side marshaling handle, cloneable into helper threads.
    pub fn bridge(&self) -> &WorkerBridge<L> {
        &self.bridge
    }

    /// Release caller-side resources. Safe to call repeatedly.
    fn release(&mut self) {
        self.on_exit.lock().unwrap().take();

        if let Some(handle) = self.join_handle.take() {
            if self.done.is_open() {
                if handle.join().is_err() {
                    tracing::error!("worker thread panicked");
                }
            }
            // Abandoned worker: dropping the handle detaches the thread.
        }
    }
}

impl<L: HostedLoop + 'static> Drop for UiThreadLifecycle<L> {
    fn drop(&mut self) {
        if !self.done.is_open() {
            tracing::warn!("lifecycle dropped while worker still running, requesting exit");
            self.request_exit();
        }
        self.release();
    }
}

/// Opens the termination latch when dropped, so it fires on every worker
/// exit path including unwinds.
struct DoneGuard(Arc<Latch<()>>);

impl Drop for DoneGuard {
    fn drop(&mut self) {
        self.0.open(());
    }
}

/// Disposes the adapter when dropped. Disposal is idempotent per the
/// [`HostedLoop`] contract and must never raise: panics are caught and
/// logged here because this runs on guaranteed-cleanup paths.
struct DisposeGuard<L: HostedLoop> {
    hosted: L,
}

impl<L: HostedLoop> Drop for DisposeGuard<L> {
    fn drop(&mut self) {
        if catch_unwind(AssertUnwindSafe(|| self.hosted.dispose())).is_err() {
            tracing::error!("hosted loop disposal panicked (ignored)");
        }
    }
}

fn worker_main<L, F, I>(
    factory: F,
    init: I,
    mut task_rx: mpsc::Receiver<WorkerTask<L>>,
    ready: Arc<Latch<Result<LoopWaker, anyhow::Error>>>,
    done: Arc<Latch<()>>,
) where
    L: HostedLoop,
    F: FnOnce() -> anyhow::Result<L>,
    I: FnOnce(&mut L) -> anyhow::Result<()>,
{
    let _done_guard = DoneGuard(done);

    let hosted = match catch_unwind(AssertUnwindSafe(factory)) {
        Ok(Ok(hosted)) => hosted,
        Ok(Err(e)) => {
            ready.open(Err(e.context("constructing hosted loop adapter")));
            return;
        }
        Err(panic) => {
            ready.open(Err(panic_error(panic)));
            return;
        }
    };

    // From here on the adapter is disposed on every exit path, exactly once.
    let mut guard = DisposeGuard { hosted };

    if let Err(e) = guard.hosted.create_root() {
        ready.open(Err(e.context("creating root handle")));
        return;
    }
    let waker = guard.hosted.waker();

    match catch_unwind(AssertUnwindSafe(|| init(&mut guard.hosted))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            ready.open(Err(e.context("initializing hosted application")));
            return;
        }
        Err(panic) => {
            ready.open(Err(panic_error(panic)));
            return;
        }
    }

    // Readiness: strictly after the root handle exists, before the run loop
    ready.open(Ok(waker));

    run_loop(&mut guard.hosted, &mut task_rx);
}

/// The hosted event loop: drain marshaled tasks, pump dispatch until idle,
/// sleep until woken, fall through once the loop reports itself finished.
/// The graceful-exit callback arrives as an ordinary task, so it always
/// runs before the loop can fall through to disposal.
fn run_loop<L: HostedLoop>(hosted: &mut L, task_rx: &mut mpsc::Receiver<WorkerTask<L>>) {
    tracing::debug!("entering hosted run loop");

    loop {
        drain_tasks(hosted, task_rx);

        while hosted.dispatch_once() {
            drain_tasks(hosted, task_rx);
            if hosted.finished() {
                break;
            }
        }

        if hosted.finished() {
            break;
        }

        hosted.idle_wait();
    }

    tracing::debug!("hosted run loop finished");
}

fn drain_tasks<L: HostedLoop>(hosted: &mut L, task_rx: &mut mpsc::Receiver<WorkerTask<L>>) {
    while let Ok(task) = task_rx.try_recv() {
        // A panicking task must not take down the event loop
        if catch_unwind(AssertUnwindSafe(|| task(hosted))).is_err() {
            tracing::error!("marshaled task panicked on the worker thread");
        }
    }
}

fn panic_error(panic: Box<dyn std::any::Any + Send>) -> anyhow::Error {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    anyhow::anyhow!("worker panicked during startup: {message}")
}
