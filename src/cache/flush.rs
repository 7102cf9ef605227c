//! Debounced persistence
//!
//! Holds at most one pending flush task. Scheduling a new flush aborts the
//! pending one, so a burst of writes results in a single storage write.

use std::sync::Mutex;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Single-slot, cancel-and-replace scheduler for flush tasks
#[derive(Debug, Default)]
pub struct DebouncedFlush {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DebouncedFlush {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` after `delay`, replacing any flush still waiting
    ///
    /// Returns `false` without running anything when called outside a tokio
    /// runtime; the caller is expected to flush synchronously instead.
    pub fn schedule<F>(&self, delay: Duration, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            return false;
        };

        let mut pending = self.lock();
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        }));
        true
    }

    /// Aborts the pending flush, returning whether one was still waiting
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.lock().as_ref().is_some_and(|handle| !handle.is_finished())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}
