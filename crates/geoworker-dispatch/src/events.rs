//! Notifications emitted by the dispatcher.

use serde::Serialize;
use serde_json::Value;

/// One notification, keyed by worker name and task id
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum DispatchEvent {
    #[serde(rename_all = "camelCase")]
    TaskComplete { worker: String, task_id: String, results: Value },
    /// Percent complete in `0.0..=100.0`
    #[serde(rename_all = "camelCase")]
    TaskProgress { worker: String, task_id: String, progress: f64 },
    #[serde(rename_all = "camelCase")]
    TaskError { worker: String, task_id: String, error: String },
}

impl DispatchEvent {
    pub fn worker(&self) -> &str {
        match self {
            DispatchEvent::TaskComplete { worker, .. }
            | DispatchEvent::TaskProgress { worker, .. }
            | DispatchEvent::TaskError { worker, .. } => worker,
        }
    }

    pub fn task_id(&self) -> &str {
        match self {
            DispatchEvent::TaskComplete { task_id, .. }
            | DispatchEvent::TaskProgress { task_id, .. }
            | DispatchEvent::TaskError { task_id, .. } => task_id,
        }
    }

    /// True for completion and error notifications
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DispatchEvent::TaskProgress { .. })
    }
}
