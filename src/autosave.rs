//! Background autosave worker.

use crate::error::Result;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Background thread that calls a tick closure every `interval`.
///
/// Nothing is ever sent on the channel: dropping the sender is the stop
/// signal. It wakes the thread immediately, and stopping then joins it. A
/// tick that is already running finishes first, so once
/// [`stop`](Self::stop) returns no tick is in flight and none will start.
pub struct AutosaveWorker {
    tx: Option<mpsc::SyncSender<()>>,
    join_handle: Option<thread::JoinHandle<()>>,
}

impl AutosaveWorker {
    /// Spawn the worker thread.
    pub fn start<F>(interval: Duration, tick: F) -> Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel::<()>(0);

        let join_handle = thread::Builder::new()
            .name("json-sets-autosave".into())
            .spawn(move || {
                tracing::debug!(?interval, "autosave worker started");
                while let Err(mpsc::RecvTimeoutError::Timeout) = rx.recv_timeout(interval) {
                    tick();
                }
                tracing::debug!("autosave worker stopped");
            })?;

        Ok(Self {
            tx: Some(tx),
            join_handle: Some(join_handle),
        })
    }

    /// Cancel the timer and wait for the thread to exit. Idempotent.
    pub fn stop(&mut self) {
        drop(self.tx.take());
        if let Some(h) = self.join_handle.take() {
            let _ = h.join();
        }
    }

    /// `true` until [`stop`](Self::stop) has been called.
    pub fn is_running(&self) -> bool {
        self.join_handle.is_some()
    }
}

impl Drop for AutosaveWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for AutosaveWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutosaveWorker")
            .field("running", &self.is_running())
            .finish()
    }
}
