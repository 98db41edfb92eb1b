//! geoworker Core - Domain models, task protocol, and configuration
//!
//! This crate contains the shared data model, the closed task catalog and wire
//! envelope, the error taxonomy, and layered configuration for the geoworker system.

pub mod config;
pub mod error;
pub mod models;
pub mod protocol;

pub use error::{GeoworkerError, Result};
pub use protocol::{Task, TaskRequest, TaskType, WorkerResponse};
