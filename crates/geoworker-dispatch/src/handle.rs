//! Per-worker bookkeeping owned by the dispatcher.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

/// State of one named worker.
///
/// Only the dispatcher mutates handles; collaborators get shared references.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerHandle {
    name: String,
    busy: bool,
    task_count: u64,
    error_count: u64,
    current_task: Option<String>,
    last_activity: Option<DateTime<Utc>>,
    #[serde(skip)]
    deadline: Option<Instant>,
}

impl WorkerHandle {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            busy: false,
            task_count: 0,
            error_count: 0,
            current_task: None,
            last_activity: None,
            deadline: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Tasks accepted by this worker since startup
    pub fn task_count(&self) -> u64 {
        self.task_count
    }

    /// Tasks that ended in an error or timeout
    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn current_task(&self) -> Option<&str> {
        self.current_task.as_deref()
    }

    /// Time of the last terminal response, `None` before the first one
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_activity
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub(crate) fn is_running(&self, task_id: &str) -> bool {
        self.current_task.as_deref() == Some(task_id)
    }

    pub(crate) fn assign(&mut self, task_id: String, deadline: Option<Instant>) {
        self.busy = true;
        self.task_count += 1;
        self.current_task = Some(task_id);
        self.deadline = deadline;
    }

    /// Mark idle after a terminal response, returning the finished task id
    pub(crate) fn release(&mut self, failed: bool) -> Option<String> {
        self.busy = false;
        self.deadline = None;
        self.last_activity = Some(Utc::now());
        if failed {
            self.error_count += 1;
        }
        self.current_task.take()
    }
}
