//! Background task that periodically flushes the store.

use super::store::KvStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to a running autosave task.
///
/// The task stops when the handle is dropped, or when every `KvStore`
/// clone has been dropped.
#[derive(Debug)]
pub struct AutosaveHandle {
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    /// Stops the autosave task.
    pub fn stop(self) {
        drop(self);
    }

    /// Returns true once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl KvStore {
    /// Starts flushing the whole store every `interval`.
    ///
    /// The first save happens one interval after the call. Failed saves are
    /// logged and the timer keeps running.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero or if called outside a tokio runtime.
    pub fn spawn_autosave(&self, interval: Duration) -> AutosaveHandle {
        let store = Arc::downgrade(&self.inner);

        tracing::info!(
            backend = %self.backend_name(),
            interval_secs = interval.as_secs_f64(),
            "Starting autosave"
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let Some(inner) = store.upgrade() else {
                    tracing::debug!("Store dropped, stopping autosave");
                    break;
                };
                let store = KvStore { inner };

                if let Err(e) = store.flush().await {
                    tracing::warn!(error = %e, "Autosave failed");
                }
            }
        });

        AutosaveHandle { task }
    }
}
