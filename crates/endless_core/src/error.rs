//! # Task Error Types
//!
//! Failures that can travel back from background work.
//!
//! Numeric generation does not fail on its own; panics and a closed pool are
//! the usual sources.

use thiserror::Error;

/// Errors reported for a background task.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The job ran and reported a failure.
    #[error("task failed: {0}")]
    Failed(String),

    /// The job panicked on its worker thread.
    #[error("worker panicked while running task")]
    WorkerPanicked,

    /// The pool was shut down before the job could be scheduled.
    #[error("worker pool is shut down")]
    PoolShutDown,

    /// The operating system refused to start a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    SpawnFailed(String),
}

/// Result type for background tasks.
pub type TaskResult<T> = Result<T, TaskError>;
