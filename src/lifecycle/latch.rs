// One-shot latch
//
// Single-fire synchronization: a slot that transitions from unset to set
// exactly once and broadcasts to every waiter. The lifecycle uses one to
// hand the startup result (waker or error) from the worker to the caller,
// and a second, valueless one to signal worker termination.

use crate::wait::Deadline;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

enum Slot<T> {
    Empty,
    Value(T),
    Taken,
}

/// A set-once slot with condvar broadcast.
///
/// Invariant: the latch opens at most once; later `open` calls are
/// rejected and the stored value never changes or reverses.
pub struct Latch<T> {
    slot: Mutex<Slot<T>>,
    cond: Condvar,
}

impl<T> Latch<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Empty),
            cond: Condvar::new(),
        }
    }

    /// Open the latch with `value`, waking all waiters.
    ///
    /// Returns false (and leaves the latch untouched) if it was already
    /// opened.
    pub fn open(&self, value: T) -> bool {
        let mut slot = self.slot.lock().unwrap();
        match *slot {
            Slot::Empty => {
                *slot = Slot::Value(value);
                self.cond.notify_all();
                true
            }
            _ => {
                tracing::warn!("latch already opened, ignoring second open");
                false
            }
        }
    }

    /// Whether the latch has been opened.
    pub fn is_open(&self) -> bool {
        !matches!(*self.slot.lock().unwrap(), Slot::Empty)
    }

    /// Block until the latch opens or `timeout` elapses.
    ///
    /// Returns true if the latch is open (whether or not its value was
    /// already taken).
    pub fn wait_opened(&self, timeout: Duration) -> bool {
        let deadline = Deadline::after(timeout);
        let mut slot = self.slot.lock().unwrap();
        loop {
            if !matches!(*slot, Slot::Empty) {
                return true;
            }
            let remaining = deadline.remaining();
            if remaining.is_zero() {
                return false;
            }
            // Spurious wakeups are handled by re-checking the slot
            slot = self.cond.wait_timeout(slot, remaining).unwrap().0;
        }
    }

    /// Block until the latch opens, then take its value.
    ///
    /// Returns `None` on timeout, or if the value was already taken by an
    /// earlier call.
    pub fn take(&self, timeout: Duration) -> Option<T> {
        let deadline = Deadline::after(timeout);
        let mut slot = self.slot.lock().unwrap();
        loop {
            match std::mem::replace(&mut *slot, Slot::Taken) {
                Slot::Value(value) => return Some(value),
                Slot::Taken => return None,
                Slot::Empty => {
                    *slot = Slot::Empty;
                    let remaining = deadline.remaining();
                    if remaining.is_zero() {
                        return None;
                    }
                    slot = self.cond.wait_timeout(slot, remaining).unwrap().0;
                }
            }
        }
    }
}

impl<T> Default for Latch<T> {
    fn default() -> Self {
        Self::new()
    }
}
