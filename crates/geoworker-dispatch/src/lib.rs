//! geoworker Dispatch - Named worker pool and task dispatcher
//!
//! The [`Dispatcher`] owns a fixed set of named workers, each running as an
//! independent tokio task. It accepts at most one outstanding task per
//! worker (load-shedding, no queueing), routes the task to the worker over a
//! channel, and turns worker responses into [`DispatchEvent`] notifications.
//! Algorithm execution happens behind the [`TaskExecutor`] trait.

pub mod dispatcher;
pub mod events;
pub mod executor;
pub mod handle;
mod worker;

pub use dispatcher::{Dispatcher, DispatcherOptions, PoolStats};
pub use events::DispatchEvent;
pub use executor::{AlgorithmExecutor, TaskExecutor};
pub use handle::WorkerHandle;
