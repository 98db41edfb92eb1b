//! Workers command implementation

use crate::output::OutputWriter;
use crate::output_types::WorkerRow;
use anyhow::{Context, Result};
use geoworker_core::config::LayeredConfig;
use geoworker_dispatch::{Dispatcher, DispatcherOptions};

pub async fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let mut dispatcher =
        Dispatcher::new(DispatcherOptions::from_config(config)).context("Failed to start worker pool")?;

    let rows: Vec<WorkerRow> = dispatcher.handles().into_iter().map(WorkerRow::from).collect();
    let timeout = config
        .task_timeout()
        .map(|t| format!("{}ms", t.as_millis()))
        .unwrap_or_else(|| "none".to_string());
    dispatcher.shutdown().await;

    output.section("Worker Pool");
    output.kv("Workers", rows.len());
    output.kv("Task Timeout", timeout);
    output.table(rows)?;
    Ok(())
}
