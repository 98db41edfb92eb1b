use chrono::{DateTime, Utc};
use geoworker_dispatch::WorkerHandle;
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

/// Output for the run command
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    /// Completion type, e.g. `CLUSTER_POINTS_COMPLETE`
    #[serde(rename = "type")]
    pub completion_type: String,
    pub worker: String,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geojson: Option<String>,
    pub results: Value,
}

/// One row of the workers table
#[derive(Debug, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRow {
    #[tabled(rename = "Worker")]
    pub name: String,
    #[tabled(rename = "Busy")]
    pub busy: bool,
    #[tabled(rename = "Tasks")]
    pub task_count: u64,
    #[tabled(rename = "Errors")]
    pub error_count: u64,
    #[tabled(rename = "Last Activity", display_with = "display_activity")]
    pub last_activity: Option<DateTime<Utc>>,
}

impl From<&WorkerHandle> for WorkerRow {
    fn from(handle: &WorkerHandle) -> Self {
        Self {
            name: handle.name().to_string(),
            busy: handle.is_busy(),
            task_count: handle.task_count(),
            error_count: handle.error_count(),
            last_activity: handle.last_activity(),
        }
    }
}

fn display_activity(activity: &Option<DateTime<Utc>>) -> String {
    activity
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string())
}

/// One row of the configuration table
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}
