//! Worker pool with one in-flight task per worker.

use futures::future::join_all;
use geoworker_core::config::{AlgorithmDefaults, LayeredConfig};
use geoworker_core::error::{GeoworkerError, Result};
use geoworker_core::protocol::{Task, TaskEnvelope, TaskType, WorkerResponse};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::events::DispatchEvent;
use crate::executor::{AlgorithmExecutor, TaskExecutor};
use crate::handle::WorkerHandle;
use crate::worker::{run_worker, WorkerMessage};

/// How the pool is built
#[derive(Debug, Clone)]
pub struct DispatcherOptions {
    /// Worker names, in the order they are listed
    pub workers: Vec<String>,
    /// Deadline for one task; `None` waits forever
    pub task_timeout: Option<Duration>,
    pub defaults: AlgorithmDefaults,
}

impl DispatcherOptions {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            workers: config.workers.value.clone(),
            task_timeout: config.task_timeout(),
            defaults: config.algorithm_defaults(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.workers.is_empty() {
            return Err(GeoworkerError::ConfigInvalid {
                key: "workers".to_string(),
                reason: "at least one worker is required".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for name in &self.workers {
            if name.trim().is_empty() {
                return Err(GeoworkerError::ConfigInvalid {
                    key: "workers".to_string(),
                    reason: "worker names cannot be empty".to_string(),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(GeoworkerError::ConfigInvalid {
                    key: "workers".to_string(),
                    reason: format!("duplicate worker name '{}'", name),
                });
            }
        }
        Ok(())
    }
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self::from_config(&LayeredConfig::with_defaults())
    }
}

/// Aggregate counters across the pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub workers: usize,
    pub busy: usize,
    pub tasks_submitted: u64,
    pub errors: u64,
}

/// Routes tasks to named workers and turns their responses into events.
///
/// A handle is busy from the moment [`Dispatcher::submit`] accepts a task
/// until the matching completion, error or timeout is observed through
/// [`Dispatcher::next_event`]. Submitting to a busy worker fails at once;
/// nothing is queued. There is no cancellation: a timed out task keeps
/// running on its worker and its late response is discarded.
pub struct Dispatcher {
    handles: HashMap<String, WorkerHandle>,
    order: Vec<String>,
    senders: HashMap<String, mpsc::Sender<TaskEnvelope>>,
    events_rx: mpsc::UnboundedReceiver<WorkerMessage>,
    workers: Vec<JoinHandle<()>>,
    timeout: Option<Duration>,
    closed: bool,
}

/// What woke the event loop
enum Wake {
    Message(Option<WorkerMessage>),
    Expired(String),
}

impl Dispatcher {
    /// Spawn one worker per configured name backed by the algorithm crates.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(options: DispatcherOptions) -> Result<Self> {
        let executor = Arc::new(AlgorithmExecutor::new(options.defaults));
        Self::with_executor(options, executor)
    }

    /// Spawn the pool with a custom executor
    pub fn with_executor(options: DispatcherOptions, executor: Arc<dyn TaskExecutor>) -> Result<Self> {
        options.validate()?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut handles = HashMap::with_capacity(options.workers.len());
        let mut senders = HashMap::with_capacity(options.workers.len());
        let mut workers = Vec::with_capacity(options.workers.len());

        for name in &options.workers {
            let (request_tx, request_rx) = mpsc::channel(1);
            workers.push(tokio::spawn(run_worker(
                name.clone(),
                request_rx,
                events_tx.clone(),
                Arc::clone(&executor),
            )));
            senders.insert(name.clone(), request_tx);
            handles.insert(name.clone(), WorkerHandle::new(name.clone()));
        }

        tracing::info!(
            workers = ?options.workers,
            timeout_ms = options.task_timeout.map(|t| t.as_millis() as u64),
            "dispatcher started"
        );

        Ok(Self {
            handles,
            order: options.workers,
            senders,
            events_rx,
            workers,
            timeout: options.task_timeout,
            closed: false,
        })
    }

    /// Hand a typed task to an idle worker, returning the new task id
    pub fn submit(&mut self, worker: &str, task: Task) -> Result<String> {
        self.check_ready(worker)?;
        let sender = self
            .senders
            .get(worker)
            .ok_or_else(|| GeoworkerError::WorkerUnavailable { worker: worker.to_string() })?;

        let id = Uuid::new_v4().to_string();
        let task_type = task.task_type();
        sender.try_send(TaskEnvelope::new(id.clone(), task)).map_err(|e| match e {
            TrySendError::Full(_) => GeoworkerError::WorkerBusy { worker: worker.to_string() },
            TrySendError::Closed(_) => GeoworkerError::WorkerUnavailable { worker: worker.to_string() },
        })?;

        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        if let Some(handle) = self.handles.get_mut(worker) {
            handle.assign(id.clone(), deadline);
        }

        tracing::info!(worker = %worker, task_id = %id, task_type = %task_type, "task submitted");
        Ok(id)
    }

    /// Submit the wire shape: a task type tag and an untyped payload
    pub fn submit_raw(&mut self, worker: &str, task_type: &str, payload: Value) -> Result<String> {
        self.check_ready(worker)?;
        let task_type: TaskType = task_type.parse()?;
        let task = Task::from_payload(task_type, payload)?;
        self.submit(worker, task)
    }

    fn check_ready(&self, worker: &str) -> Result<()> {
        if self.closed {
            return Err(GeoworkerError::DispatcherClosed);
        }
        match self.handles.get(worker) {
            None => Err(GeoworkerError::WorkerUnavailable { worker: worker.to_string() }),
            Some(handle) if handle.is_busy() => {
                Err(GeoworkerError::WorkerBusy { worker: worker.to_string() })
            }
            Some(_) => Ok(()),
        }
    }

    /// Wait for the next notification.
    ///
    /// Returns `None` once every worker has stopped. With no task in flight
    /// and live workers this waits until one is submitted elsewhere, so
    /// callers should only poll while tasks are outstanding.
    pub async fn next_event(&mut self) -> Option<DispatchEvent> {
        loop {
            let wake = match self.earliest_deadline() {
                Some((worker, deadline)) => {
                    tokio::select! {
                        message = self.events_rx.recv() => Wake::Message(message),
                        _ = tokio::time::sleep_until(deadline) => Wake::Expired(worker),
                    }
                }
                None => Wake::Message(self.events_rx.recv().await),
            };

            match wake {
                Wake::Expired(worker) => {
                    if let Some(event) = self.expire(&worker) {
                        return Some(event);
                    }
                }
                Wake::Message(None) => return None,
                Wake::Message(Some((worker, response))) => {
                    if let Some(event) = self.accept(worker, response) {
                        return Some(event);
                    }
                }
            }
        }
    }

    fn earliest_deadline(&self) -> Option<(String, Instant)> {
        self.handles
            .values()
            .filter_map(|handle| handle.deadline().map(|deadline| (handle.name(), deadline)))
            .min_by_key(|(_, deadline)| *deadline)
            .map(|(name, deadline)| (name.to_string(), deadline))
    }

    fn expire(&mut self, worker: &str) -> Option<DispatchEvent> {
        let timeout_ms = self.timeout.map(|t| t.as_millis() as u64).unwrap_or_default();
        let handle = self.handles.get_mut(worker)?;
        let task_id = handle.release(true)?;
        let error = GeoworkerError::WorkerTimeout {
            worker: worker.to_string(),
            task_id: task_id.clone(),
            timeout_ms,
        };
        tracing::warn!(worker = %worker, task_id = %task_id, "{}", error);
        Some(DispatchEvent::TaskError { worker: worker.to_string(), task_id, error: error.to_string() })
    }

    /// Apply one worker response to its handle
    fn accept(&mut self, worker: String, response: WorkerResponse) -> Option<DispatchEvent> {
        let Some(handle) = self.handles.get_mut(&worker) else {
            tracing::warn!(worker = %worker, "dropping response from unknown worker");
            return None;
        };
        if !handle.is_running(response.id()) {
            tracing::warn!(
                worker = %worker,
                task_id = %response.id(),
                "dropping response for a task that is no longer in flight"
            );
            return None;
        }

        let event = match response {
            WorkerResponse::Progress { id, progress } => {
                DispatchEvent::TaskProgress { worker, task_id: id, progress }
            }
            WorkerResponse::Complete { id, results, .. } => {
                handle.release(false);
                tracing::info!(worker = %worker, task_id = %id, "task complete");
                DispatchEvent::TaskComplete { worker, task_id: id, results }
            }
            WorkerResponse::Error { id, error } => {
                handle.release(true);
                tracing::info!(worker = %worker, task_id = %id, "task failed");
                DispatchEvent::TaskError { worker, task_id: id, error }
            }
        };
        Some(event)
    }

    /// Submit a task and wait for its result
    pub async fn run(&mut self, worker: &str, task: Task) -> Result<Value> {
        self.run_with_progress(worker, task, |_| {}).await
    }

    /// Submit a task and wait for its result, forwarding its progress.
    ///
    /// Events for other tasks that arrive meanwhile are discarded.
    pub async fn run_with_progress<F>(&mut self, worker: &str, task: Task, mut on_progress: F) -> Result<Value>
    where
        F: FnMut(f64),
    {
        let task_id = self.submit(worker, task)?;

        while let Some(event) = self.next_event().await {
            if event.task_id() != task_id {
                tracing::debug!(worker = %event.worker(), task_id = %event.task_id(), "discarding unrelated event");
                continue;
            }
            match event {
                DispatchEvent::TaskProgress { progress, .. } => on_progress(progress),
                DispatchEvent::TaskComplete { results, .. } => return Ok(results),
                DispatchEvent::TaskError { error, .. } => {
                    return Err(GeoworkerError::WorkerRuntime { worker: worker.to_string(), reason: error })
                }
            }
        }

        Err(GeoworkerError::DispatcherClosed)
    }

    pub fn is_available(&self, worker: &str) -> bool {
        !self.closed && self.handles.get(worker).is_some_and(|handle| !handle.is_busy())
    }

    /// Idle workers, in configured order
    pub fn list_available(&self) -> Vec<String> {
        self.order.iter().filter(|name| self.is_available(name)).cloned().collect()
    }

    pub fn handle(&self, worker: &str) -> Option<&WorkerHandle> {
        self.handles.get(worker)
    }

    /// All handles, in configured order
    pub fn handles(&self) -> Vec<&WorkerHandle> {
        self.order.iter().filter_map(|name| self.handles.get(name)).collect()
    }

    pub fn stats(&self) -> PoolStats {
        self.handles.values().fold(
            PoolStats { workers: self.handles.len(), ..Default::default() },
            |mut stats, handle| {
                stats.busy += usize::from(handle.is_busy());
                stats.tasks_submitted += handle.task_count();
                stats.errors += handle.error_count();
                stats
            },
        )
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Stop accepting tasks, let workers finish what they hold and release every handle
    pub async fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.senders.clear();

        let results = join_all(self.workers.drain(..)).await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            tracing::warn!(failed, "some workers did not stop cleanly");
        }

        for handle in self.handles.values_mut() {
            if handle.is_busy() {
                handle.release(false);
            }
        }
        tracing::info!(workers = self.handles.len(), "dispatcher shut down");
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
    }
}
