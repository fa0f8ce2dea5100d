// WorkerBridge - marshals closures onto the hosted loop's worker thread
//
// Foreign toolkits require all handle operations on one thread. The bridge
// makes that rule explicit: callers hand it a closure, the worker drains
// the queue between event dispatches and runs the closure with exclusive
// access to the adapter. Two variants mirror the toolkit tradition:
// fire-and-continue, and block-until-executed.

use crate::loop_host::{HostedLoop, LoopWaker};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// A closure queued for execution on the worker thread.
pub type WorkerTask<L> = Box<dyn FnOnce(&mut L) + Send>;

/// Marshaling queue depth. Bounded so a wedged worker surfaces as
/// `QueueFull` instead of unbounded memory growth.
pub(crate) const TASK_QUEUE_CAPACITY: usize = 64;

/// Errors from marshaling work onto the worker thread
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("worker task queue is full")]
    QueueFull,

    #[error("worker thread exited before executing the task")]
    WorkerGone,
}

/// Caller-side handle for running closures on the worker thread.
///
/// Cloneable; every clone feeds the same queue. The receiving end lives in
/// the lifecycle's run loop, which drains it between event dispatches.
pub struct WorkerBridge<L: HostedLoop> {
    task_tx: mpsc::Sender<WorkerTask<L>>,
    waker: LoopWaker,
}

impl<L: HostedLoop> WorkerBridge<L> {
    /// Create the task channel. The sender half goes into the bridge once
    /// the worker has handed back its waker; the receiver moves into the
    /// worker's run loop.
    pub(crate) fn channel() -> (mpsc::Sender<WorkerTask<L>>, mpsc::Receiver<WorkerTask<L>>) {
        mpsc::channel(TASK_QUEUE_CAPACITY)
    }

    pub(crate) fn new(task_tx: mpsc::Sender<WorkerTask<L>>, waker: LoopWaker) -> Self {
        Self { task_tx, waker }
    }

    /// Queue a closure for the worker and continue immediately.
    ///
    /// The closure runs the next time the worker drains its queue, which
    /// may be after its current idle wait ends; callers that need prompt
    /// execution should follow up with a wake nudge (or use
    /// [`run_on_worker_sync`](Self::run_on_worker_sync), which nudges for
    /// them).
    pub fn run_on_worker<F>(&self, f: F) -> Result<(), BridgeError>
    where
        F: FnOnce(&mut L) + Send + 'static,
    {
        match self.task_tx.try_send(Box::new(f)) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("worker task queue full - dropping task");
                Err(BridgeError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("worker task queue closed - worker has exited");
                Err(BridgeError::WorkerGone)
            }
        }
    }

    /// Queue a closure, wake the loop, and block until it has executed.
    ///
    /// Returns the closure's value. Must not be called from the worker
    /// thread itself: the worker cannot drain its own queue while blocked
    /// here.
    ///
    /// # Errors
    ///
    /// [`BridgeError::WorkerGone`] when the worker exits before executing
    /// the task (including a task that panicked on the worker, which is
    /// caught and logged there).
    pub fn run_on_worker_sync<F, R>(&self, f: F) -> Result<R, BridgeError>
    where
        F: FnOnce(&mut L) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let task: WorkerTask<L> = Box::new(move |hosted| {
            // Receiver gone means the caller stopped waiting; nothing to do
            let _ = reply_tx.send(f(hosted));
        });

        self.task_tx
            .blocking_send(task)
            .map_err(|_| BridgeError::WorkerGone)?;
        self.waker.wake();

        reply_rx.blocking_recv().map_err(|_| BridgeError::WorkerGone)
    }

    pub(crate) fn waker(&self) -> &LoopWaker {
        &self.waker
    }
}

// Manual Clone implementation to avoid requiring L: Clone
impl<L: HostedLoop> Clone for WorkerBridge<L> {
    fn clone(&self) -> Self {
        Self {
            task_tx: self.task_tx.clone(),
            waker: self.waker.clone(),
        }
    }
}
