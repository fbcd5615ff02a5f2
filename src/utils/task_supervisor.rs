use tokio::task::JoinHandle;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use crate::error::{Error, Result};
use tracing::{debug, error, info};

/// Task Supervisor - Tracks fire-and-forget background work
///
/// ## Purpose
/// Read requests return before their side effects (durable write-back,
/// cache refresh) finish. Those side effects run as detached tokio tasks and
/// keep running after the request that spawned them has completed. The
/// supervisor keeps their handles so shutdown can drain them and failures
/// (panics) are reported instead of silently lost.
///
/// ## Usage
/// ```rust,ignore
/// let supervisor = TaskSupervisor::new();
///
/// supervisor.spawn("durable_write_back", async move {
///     // task logic, owns its own error handling
/// });
///
/// // On shutdown, wait for in-flight work
/// supervisor.wait_idle().await?;
/// ```
pub struct TaskSupervisor {
    tasks: Mutex<Vec<(String, JoinHandle<()>)>>,
}

impl TaskSupervisor {
    pub fn new() -> Self {
        TaskSupervisor {
            tasks: Mutex::new(Vec::new()),
        }
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<(String, JoinHandle<()>)>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn a detached background task and register it.
    /// The caller does not wait for it.
    pub fn spawn<F>(&self, name: impl Into<String>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let handle = tokio::spawn(future);

        debug!("Spawned background task: {}", name);
        let mut tasks = self.tasks();
        tasks.retain(|(_, handle)| !handle.is_finished());
        tasks.push((name, handle));
    }

    /// Get count of tasks that have not finished yet
    pub fn active_task_count(&self) -> usize {
        let mut tasks = self.tasks();
        tasks.retain(|(_, handle)| !handle.is_finished());
        tasks.len()
    }

    /// Wait until every registered task (including ones spawned while
    /// waiting) has finished. Returns an error naming tasks that panicked.
    pub async fn wait_idle(&self) -> Result<()> {
        let mut failed = Vec::new();

        loop {
            let batch: Vec<_> = self.tasks().drain(..).collect();
            if batch.is_empty() {
                break;
            }

            for (name, handle) in batch {
                if let Err(e) = handle.await {
                    error!("Background task {} failed: {:?}", name, e);
                    failed.push(name);
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::TaskFailed(format!("{:?}", failed)))
        }
    }

    /// Abort everything still running
    pub fn shutdown_all(&self) {
        let tasks: Vec<_> = self.tasks().drain(..).collect();
        info!("Aborting {} background tasks", tasks.len());

        for (name, handle) in tasks {
            handle.abort();
            debug!("Aborted task: {}", name);
        }
    }
}

impl Default for TaskSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
