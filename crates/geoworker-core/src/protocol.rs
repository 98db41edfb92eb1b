//! Task protocol shared by the dispatcher and the workers.
//!
//! The catalog of task types is closed: every wire tag maps to exactly one
//! [`TaskType`] and one typed [`Task`] variant. Unknown tags are rejected with
//! [`GeoworkerError::UnknownTaskType`] at the protocol boundary.
//!
//! Wire shapes:
//! - request: `{ "taskType": "<TASK>", "payload": {...}, "id": "..." }`
//! - response: `{ "type": "<TASK>_COMPLETE" | "PROGRESS" | "ERROR", "id": "...", ... }`

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{GeoworkerError, Result};
use crate::models::{
    AggregateDataRequest, AnalyzeSitesRequest, ApplyFiltersRequest, CalculateDistancesRequest,
    CleanDataRequest, ClusterRequest, ScoreSitesRequest, SpatialRequest, TransformDataRequest,
    ValidateDataRequest,
};

const COMPLETE_SUFFIX: &str = "_COMPLETE";
const PROGRESS_TYPE: &str = "PROGRESS";
const ERROR_TYPE: &str = "ERROR";

/// Closed catalog of task types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    AnalyzeSites,
    CalculateDistances,
    ScoreSites,
    ApplyFilters,
    ValidateData,
    CleanData,
    TransformData,
    AggregateData,
    ClusterPoints,
    SpatialAnalysis,
}

impl TaskType {
    pub const ALL: [TaskType; 10] = [
        TaskType::AnalyzeSites,
        TaskType::CalculateDistances,
        TaskType::ScoreSites,
        TaskType::ApplyFilters,
        TaskType::ValidateData,
        TaskType::CleanData,
        TaskType::TransformData,
        TaskType::AggregateData,
        TaskType::ClusterPoints,
        TaskType::SpatialAnalysis,
    ];

    /// Wire tag, e.g. `SCORE_SITES`
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::AnalyzeSites => "ANALYZE_SITES",
            TaskType::CalculateDistances => "CALCULATE_DISTANCES",
            TaskType::ScoreSites => "SCORE_SITES",
            TaskType::ApplyFilters => "APPLY_FILTERS",
            TaskType::ValidateData => "VALIDATE_DATA",
            TaskType::CleanData => "CLEAN_DATA",
            TaskType::TransformData => "TRANSFORM_DATA",
            TaskType::AggregateData => "AGGREGATE_DATA",
            TaskType::ClusterPoints => "CLUSTER_POINTS",
            TaskType::SpatialAnalysis => "SPATIAL_ANALYSIS",
        }
    }

    /// Response tag for a successful run, e.g. `SCORE_SITES_COMPLETE`
    pub fn completion_type(&self) -> String {
        format!("{}{}", self.as_str(), COMPLETE_SUFFIX)
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = GeoworkerError;

    fn from_str(s: &str) -> Result<Self> {
        TaskType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| GeoworkerError::UnknownTaskType { task_type: s.to_string() })
    }
}

/// A task with its typed payload
#[derive(Debug, Clone)]
pub enum Task {
    AnalyzeSites(AnalyzeSitesRequest),
    CalculateDistances(CalculateDistancesRequest),
    ScoreSites(ScoreSitesRequest),
    ApplyFilters(ApplyFiltersRequest),
    ValidateData(ValidateDataRequest),
    CleanData(CleanDataRequest),
    TransformData(TransformDataRequest),
    AggregateData(AggregateDataRequest),
    ClusterPoints(ClusterRequest),
    SpatialAnalysis(SpatialRequest),
}

impl Task {
    pub fn task_type(&self) -> TaskType {
        match self {
            Task::AnalyzeSites(_) => TaskType::AnalyzeSites,
            Task::CalculateDistances(_) => TaskType::CalculateDistances,
            Task::ScoreSites(_) => TaskType::ScoreSites,
            Task::ApplyFilters(_) => TaskType::ApplyFilters,
            Task::ValidateData(_) => TaskType::ValidateData,
            Task::CleanData(_) => TaskType::CleanData,
            Task::TransformData(_) => TaskType::TransformData,
            Task::AggregateData(_) => TaskType::AggregateData,
            Task::ClusterPoints(_) => TaskType::ClusterPoints,
            Task::SpatialAnalysis(_) => TaskType::SpatialAnalysis,
        }
    }

    /// Decode a payload for the given task type
    pub fn from_payload(task_type: TaskType, payload: Value) -> Result<Self> {
        fn decode<T: serde::de::DeserializeOwned>(task_type: TaskType, payload: Value) -> Result<T> {
            serde_json::from_value(payload).map_err(|e| GeoworkerError::InvalidPayload {
                task_type: task_type.to_string(),
                reason: e.to_string(),
            })
        }

        let task = match task_type {
            TaskType::AnalyzeSites => Task::AnalyzeSites(decode(task_type, payload)?),
            TaskType::CalculateDistances => Task::CalculateDistances(decode(task_type, payload)?),
            TaskType::ScoreSites => Task::ScoreSites(decode(task_type, payload)?),
            TaskType::ApplyFilters => Task::ApplyFilters(decode(task_type, payload)?),
            TaskType::ValidateData => Task::ValidateData(decode(task_type, payload)?),
            TaskType::CleanData => Task::CleanData(decode(task_type, payload)?),
            TaskType::TransformData => Task::TransformData(decode(task_type, payload)?),
            TaskType::AggregateData => Task::AggregateData(decode(task_type, payload)?),
            TaskType::ClusterPoints => Task::ClusterPoints(decode(task_type, payload)?),
            TaskType::SpatialAnalysis => Task::SpatialAnalysis(decode(task_type, payload)?),
        };
        Ok(task)
    }
}

/// A task paired with the identifier the dispatcher assigned to it
#[derive(Debug, Clone)]
pub struct TaskEnvelope {
    pub id: String,
    pub task: Task,
}

impl TaskEnvelope {
    pub fn new(id: impl Into<String>, task: Task) -> Self {
        Self { id: id.into(), task }
    }
}

/// Wire request envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub task_type: TaskType,
    pub payload: Value,
    pub id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTaskRequest {
    task_type: String,
    #[serde(default)]
    payload: Value,
    id: String,
}

impl TaskRequest {
    /// Parse a wire request, validating the task type before anything else
    pub fn from_json(value: Value) -> Result<Self> {
        let raw: RawTaskRequest = serde_json::from_value(value)?;
        let task_type = raw.task_type.parse::<TaskType>()?;
        Ok(Self { task_type, payload: raw.payload, id: raw.id })
    }

    /// Decode the payload into a typed envelope
    pub fn into_envelope(self) -> Result<TaskEnvelope> {
        let task = Task::from_payload(self.task_type, self.payload)?;
        Ok(TaskEnvelope { id: self.id, task })
    }
}

/// A message posted by a worker: zero or more progress updates followed
/// by exactly one completion or error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireResponse", into = "WireResponse")]
pub enum WorkerResponse {
    Complete { task_type: TaskType, id: String, results: Value },
    Progress { id: String, progress: f64 },
    Error { id: String, error: String },
}

impl WorkerResponse {
    /// Progress update, clamped to `0.0..=100.0`
    pub fn progress(id: impl Into<String>, progress: f64) -> Self {
        let progress = if progress.is_finite() { progress.clamp(0.0, 100.0) } else { 0.0 };
        WorkerResponse::Progress { id: id.into(), progress }
    }

    pub fn id(&self) -> &str {
        match self {
            WorkerResponse::Complete { id, .. }
            | WorkerResponse::Progress { id, .. }
            | WorkerResponse::Error { id, .. } => id,
        }
    }

    /// True for completion and error responses
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerResponse::Progress { .. })
    }

    /// The wire `type` tag
    pub fn type_tag(&self) -> String {
        match self {
            WorkerResponse::Complete { task_type, .. } => task_type.completion_type(),
            WorkerResponse::Progress { .. } => PROGRESS_TYPE.to_string(),
            WorkerResponse::Error { .. } => ERROR_TYPE.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireResponse {
    #[serde(rename = "type")]
    kind: String,
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    results: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<WorkerResponse> for WireResponse {
    fn from(response: WorkerResponse) -> Self {
        let kind = response.type_tag();
        match response {
            WorkerResponse::Complete { id, results, .. } => {
                WireResponse { kind, id, results: Some(results), progress: None, error: None }
            }
            WorkerResponse::Progress { id, progress } => {
                WireResponse { kind, id, results: None, progress: Some(progress), error: None }
            }
            WorkerResponse::Error { id, error } => {
                WireResponse { kind, id, results: None, progress: None, error: Some(error) }
            }
        }
    }
}

impl TryFrom<WireResponse> for WorkerResponse {
    type Error = GeoworkerError;

    fn try_from(wire: WireResponse) -> Result<Self> {
        match wire.kind.as_str() {
            PROGRESS_TYPE => Ok(WorkerResponse::progress(wire.id, wire.progress.unwrap_or(0.0))),
            ERROR_TYPE => Ok(WorkerResponse::Error {
                id: wire.id,
                error: wire.error.unwrap_or_else(|| "unknown error".to_string()),
            }),
            kind => {
                let tag = kind
                    .strip_suffix(COMPLETE_SUFFIX)
                    .ok_or_else(|| GeoworkerError::UnknownTaskType { task_type: kind.to_string() })?;
                Ok(WorkerResponse::Complete {
                    task_type: tag.parse()?,
                    id: wire.id,
                    results: wire.results.unwrap_or(Value::Null),
                })
            }
        }
    }
}
