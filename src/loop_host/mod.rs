// Hosted event loop seam
//
// The harness never links a concrete UI toolkit. Everything it needs from
// one — root handle creation, event dispatch, idle sleep, wake, disposal —
// goes through the HostedLoop trait, implemented per toolkit by the test
// suite that embeds the harness. The trait's shape follows the classic
// single-threaded display loop: dispatch pending events, sleep when idle,
// wake on external stimulus, run until the last window is gone.

pub mod bridge;

pub use bridge::{BridgeError, WorkerBridge, WorkerTask};

use std::fmt;
use std::sync::Arc;

/// Adapter over a foreign toolkit's message loop and root handle.
///
/// One adapter instance is owned exclusively by the lifecycle's worker
/// thread; every method except [`waker`](Self::waker) (whose returned
/// handle is the one sanctioned cross-thread channel into the loop) is
/// invoked on that thread only. Implementations may therefore keep the
/// toolkit's thread-affine handles as plain fields.
pub trait HostedLoop: Send {
    /// Create the toolkit's root handle.
    ///
    /// Called once, on the worker thread, before readiness is signaled.
    /// An error here fails startup and the caller of
    /// [`UiThreadLifecycle::start`](crate::lifecycle::UiThreadLifecycle::start)
    /// receives it synchronously.
    fn create_root(&mut self) -> anyhow::Result<()>;

    /// Dispatch one pending event. Returns true if there was work to do.
    fn dispatch_once(&mut self) -> bool;

    /// Block until an event, a timer, or a wake nudge arrives.
    ///
    /// A nudge delivered while the loop is busy dispatching must be
    /// sticky: the next `idle_wait` returns immediately instead of losing
    /// it. The shutdown escalation sequence relies on this.
    fn idle_wait(&mut self);

    /// True once the hosted loop has wound down past its last window and
    /// the run loop should fall through to disposal.
    fn finished(&self) -> bool;

    /// Release the root handle. Must be idempotent; the lifecycle calls it
    /// on the worker on every exit path, and implementations must not
    /// panic when nothing is left to release.
    fn dispose(&mut self);

    /// Cross-thread wake handle for nudging a sleeping [`idle_wait`](Self::idle_wait).
    fn waker(&self) -> LoopWaker;
}

/// Cheap, cloneable handle that unblocks a sleeping hosted loop.
///
/// The only part of the adapter that is legal to touch from outside the
/// worker thread.
#[derive(Clone)]
pub struct LoopWaker {
    wake: Arc<dyn Fn() + Send + Sync>,
}

impl LoopWaker {
    pub fn new(wake: impl Fn() + Send + Sync + 'static) -> Self {
        Self { wake: Arc::new(wake) }
    }

    /// Nudge the loop out of its idle wait.
    pub fn wake(&self) {
        (self.wake)();
    }
}

impl fmt::Debug for LoopWaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LoopWaker")
    }
}
