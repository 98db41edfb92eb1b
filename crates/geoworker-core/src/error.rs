//! Error types for geoworker

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoworkerError {
    // Dispatcher errors (submit-time, never touch pool state)
    #[error("Worker unavailable: no worker named '{worker}'")]
    WorkerUnavailable { worker: String },

    #[error("Worker '{worker}' is busy with another task")]
    WorkerBusy { worker: String },

    // Protocol errors
    #[error("Unknown task type: {task_type}")]
    UnknownTaskType { task_type: String },

    #[error("Invalid payload for {task_type}: {reason}")]
    InvalidPayload { task_type: String, reason: String },

    // Algorithm errors
    #[error("Invalid {algorithm} options: {reason}")]
    InvalidOptions { algorithm: String, reason: String },

    // Worker errors (asynchronous, reported through error notifications)
    #[error("Worker '{worker}' failed: {reason}")]
    WorkerRuntime { worker: String, reason: String },

    #[error("Task {task_id} on worker '{worker}' timed out after {timeout_ms}ms")]
    WorkerTimeout {
        worker: String,
        task_id: String,
        timeout_ms: u64,
    },

    #[error("Dispatcher has been shut down")]
    DispatcherClosed,

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GeoworkerError {
    /// Shorthand for an options error raised by an algorithm
    pub fn invalid_options(algorithm: &str, reason: impl Into<String>) -> Self {
        GeoworkerError::InvalidOptions {
            algorithm: algorithm.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for GeoworkerError {
    fn from(err: serde_json::Error) -> Self {
        GeoworkerError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeoworkerError>;
