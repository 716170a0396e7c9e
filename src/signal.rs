//! One-shot readiness latch.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Flips from "not ready" to "ready" exactly once and wakes every waiter.
#[derive(Default)]
pub struct Readiness {
    ready: Mutex<bool>,
    cond: Condvar,
}

impl Readiness {
    /// Latch in the "not ready" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch that starts out ready.
    pub fn ready() -> Self {
        Self {
            ready: Mutex::new(true),
            cond: Condvar::new(),
        }
    }

    /// Mark ready and wake all waiters. Later calls are no-ops.
    pub fn set(&self) {
        let mut ready = self.ready.lock();
        if !*ready {
            *ready = true;
            self.cond.notify_all();
        }
    }

    /// Current state, without waiting.
    pub fn is_set(&self) -> bool {
        *self.ready.lock()
    }

    /// Block until ready.
    pub fn wait(&self) {
        let mut ready = self.ready.lock();
        while !*ready {
            self.cond.wait(&mut ready);
        }
    }

    /// Block until ready or `timeout` elapses. Returns the final state.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut ready = self.ready.lock();
        while !*ready {
            if self.cond.wait_until(&mut ready, deadline).timed_out() {
                break;
            }
        }
        *ready
    }
}

impl std::fmt::Debug for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Readiness")
            .field("ready", &self.is_set())
            .finish()
    }
}
