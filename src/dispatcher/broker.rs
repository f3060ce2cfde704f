//! Durable task broker abstraction and an in-process default backend.
//!
//! A real deployment would back this with a Redis-compatible broker and
//! result store; the in-process backend satisfies the same contract for
//! single-host runs and tests, per the "simple in-process worker pool"
//! alternative backend this system's design notes permit.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::Task;
use crate::error::{DispatchError, Result};

/// Required operations on a durable task broker: enqueue, claim, and a
/// result store read/write keyed by task id.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Enqueues a task, or re-enqueues one reclaimed from a lost worker.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::BrokerUnreachable`] if the broker cannot
    /// accept the task.
    async fn enqueue(&self, task: Task) -> Result<()>;

    /// Claims up to `max` pending tasks, marking them `running`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::BrokerUnreachable`] if the broker cannot be
    /// reached.
    async fn claim_batch(&self, max: usize) -> Result<Vec<Task>>;

    /// Writes a task's current state to the result store. Non-terminal
    /// states are re-enqueued so another worker can reclaim the task.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::BrokerUnreachable`] if the write fails.
    async fn write_result(&self, task: &Task) -> Result<()>;

    /// Reads a task's current record directly from the result store,
    /// independent of any in-memory handle a worker may hold.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ResultReadFailed`] if the id is unknown to
    /// the result store.
    async fn read_result(&self, task_id: &str) -> Result<Option<Task>>;
}

/// In-process broker backed by a `Vec`-based FIFO queue and a hash map
/// result store, both behind a mutex. Suitable for a single host; not
/// durable across process restarts.
#[derive(Default)]
pub struct InProcessBroker {
    queue: Mutex<VecDeque<Task>>,
    store: Mutex<HashMap<String, Task>>,
}

impl InProcessBroker {
    /// Creates an empty broker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Broker for InProcessBroker {
    async fn enqueue(&self, task: Task) -> Result<()> {
        self.store
            .lock()
            .map_err(|_| DispatchError::BrokerUnreachable("result store poisoned".to_string()))?
            .insert(task.task_id.clone(), task.clone());
        self.queue
            .lock()
            .map_err(|_| DispatchError::BrokerUnreachable("queue poisoned".to_string()))?
            .push_back(task);
        Ok(())
    }

    async fn claim_batch(&self, max: usize) -> Result<Vec<Task>> {
        let mut queue = self
            .queue
            .lock()
            .map_err(|_| DispatchError::BrokerUnreachable("queue poisoned".to_string()))?;
        let n = max.min(queue.len());
        let mut claimed = Vec::with_capacity(n);
        for _ in 0..n {
            if let Some(mut task) = queue.pop_front() {
                task.status = crate::core::TaskStatus::Running;
                claimed.push(task);
            }
        }
        Ok(claimed)
    }

    async fn write_result(&self, task: &Task) -> Result<()> {
        self.store
            .lock()
            .map_err(|_| DispatchError::BrokerUnreachable("result store poisoned".to_string()))?
            .insert(task.task_id.clone(), task.clone());

        if !task.status.is_terminal() {
            self.queue
                .lock()
                .map_err(|_| DispatchError::BrokerUnreachable("queue poisoned".to_string()))?
                .push_back(task.clone());
        }
        Ok(())
    }

    async fn read_result(&self, task_id: &str) -> Result<Option<Task>> {
        Ok(self
            .store
            .lock()
            .map_err(|_| DispatchError::BrokerUnreachable("result store poisoned".to_string()))?
            .get(task_id)
            .cloned())
    }
}
