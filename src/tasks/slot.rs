//! Single-outstanding task handle

use std::sync::{Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::debug;

/// Holds at most one background task; installing a new one aborts the old.
///
/// Aborting only takes effect at the task's next await point, so tasks
/// placed here must also check a generation before mutating shared state.
#[derive(Debug)]
pub struct TaskSlot {
    name: &'static str,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TaskSlot {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handle: Mutex::new(None),
        }
    }

    /// Install `handle`, aborting whatever was there before
    pub fn replace(&self, handle: JoinHandle<()>) {
        let previous = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            if !previous.is_finished() {
                debug!("Superseding {} task", self.name);
            }
            previous.abort();
        }
    }

    /// Abort the outstanding task, if any. Idempotent.
    pub fn cancel(&self) {
        let current = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(current) = current {
            current.abort();
        }
    }

    /// Whether a task is installed and has not finished
    pub fn is_active(&self) -> bool {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
