//! The loop each named worker runs.

use geoworker_core::error::GeoworkerError;
use geoworker_core::protocol::{TaskEnvelope, WorkerResponse};
use std::any::Any;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::executor::TaskExecutor;

/// Response tagged with the worker that produced it
pub(crate) type WorkerMessage = (String, WorkerResponse);

/// Receive tasks one at a time and post their responses.
///
/// Each task runs on a blocking thread so long computations never stall the
/// runtime. A panic inside the executor is reported as an error response and
/// the loop keeps serving. The loop ends once the request channel closes or
/// the dispatcher stops listening.
pub(crate) async fn run_worker(
    name: String,
    mut requests: mpsc::Receiver<TaskEnvelope>,
    events: mpsc::UnboundedSender<WorkerMessage>,
    executor: Arc<dyn TaskExecutor>,
) {
    tracing::debug!(worker = %name, "worker started");

    while let Some(TaskEnvelope { id, task }) = requests.recv().await {
        let task_type = task.task_type();
        let executor = Arc::clone(&executor);
        let progress_events = events.clone();
        let progress_name = name.clone();
        let progress_id = id.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            let mut report = |percent: f64| {
                // Ignore send failures: the dispatcher is gone and the final response will fail too
                let _ = progress_events
                    .send((progress_name.clone(), WorkerResponse::progress(progress_id.clone(), percent)));
            };
            executor.execute(task, &mut report)
        })
        .await;

        let response = match outcome {
            Ok(Ok(results)) => {
                tracing::debug!(worker = %name, task_id = %id, task_type = %task_type, "task complete");
                WorkerResponse::Complete { task_type, id, results }
            }
            Ok(Err(e)) => {
                tracing::error!(worker = %name, task_id = %id, task_type = %task_type, "task failed: {}", e);
                WorkerResponse::Error { id, error: e.to_string() }
            }
            Err(join_error) => {
                let reason = if join_error.is_panic() {
                    panic_message(join_error.into_panic())
                } else {
                    "task was cancelled".to_string()
                };
                let error = GeoworkerError::WorkerRuntime { worker: name.clone(), reason };
                tracing::error!(worker = %name, task_id = %id, task_type = %task_type, "{}", error);
                WorkerResponse::Error { id, error: error.to_string() }
            }
        };

        if events.send((name.clone(), response)).is_err() {
            break;
        }
    }

    tracing::debug!(worker = %name, "worker stopped");
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new("bang".to_string())), "bang");
        assert_eq!(panic_message(Box::new(42u8)), "worker panicked");
    }
}
