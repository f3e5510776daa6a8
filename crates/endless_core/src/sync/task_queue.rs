//! # Task Queue
//!
//! Submits keyed jobs to a shared `WorkerPool` and buffers their results
//! until the owning thread drains them.
//!
//! ## Guarantees
//!
//! - Every accepted submission produces exactly one `Completion`, even when
//!   the job fails, panics, or the pool was already shut down.
//! - Completions are delivered in the order workers finished them.
//! - While a key is in flight (submitted, not yet drained), further
//!   submissions with the same key are ignored.
//! - No cancellation: work for keys the owner no longer cares about still
//!   runs, and its completion still arrives. Callers must tolerate it.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{TaskError, TaskResult};
use crate::sync::WorkerPool;

/// A finished task, handed back to the owning thread.
#[derive(Debug)]
pub struct Completion<K, T> {
    /// The key the task was submitted under.
    pub key: K,
    /// What the task produced.
    pub result: TaskResult<T>,
}

/// Outcome of `TaskQueue::submit`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submission {
    /// The job was accepted; a completion will follow.
    Queued,
    /// A job with the same key is already in flight; nothing was queued.
    Duplicate,
}

/// State shared between the queue handle and in-flight jobs.
struct Shared<K, T> {
    /// Results waiting for the next drain.
    completed: Mutex<VecDeque<Completion<K, T>>>,
    /// Keys submitted but not yet drained.
    in_flight: Mutex<HashSet<K>>,
}

/// Keyed background-task queue with a single-consumer drain.
///
/// Several queues can share one pool; each queue has its own result buffer,
/// so there is no ordering relation between completions of different queues.
pub struct TaskQueue<K, T> {
    /// Pool the jobs run on.
    pool: Arc<WorkerPool>,
    /// Result buffer and in-flight set.
    shared: Arc<Shared<K, T>>,
}

impl<K, T> TaskQueue<K, T>
where
    K: Eq + Hash + Clone + Send + 'static,
    T: Send + 'static,
{
    /// Creates an empty queue that runs its jobs on `pool`.
    #[must_use]
    pub fn new(pool: Arc<WorkerPool>) -> Self {
        Self {
            pool,
            shared: Arc::new(Shared {
                completed: Mutex::new(VecDeque::new()),
                in_flight: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Runs `work` on a worker and queues its result under `key`.
    ///
    /// Returns `Submission::Duplicate` without running anything if `key` is
    /// already in flight.
    pub fn submit<F>(&self, key: K, work: F) -> Submission
    where
        F: FnOnce() -> TaskResult<T> + Send + 'static,
    {
        if !self.shared.in_flight.lock().insert(key.clone()) {
            return Submission::Duplicate;
        }

        let shared = Arc::clone(&self.shared);
        let job_key = key.clone();
        let scheduled = self.pool.execute(move || {
            let result = catch_unwind(AssertUnwindSafe(work))
                .unwrap_or(Err(TaskError::WorkerPanicked));
            shared.completed.lock().push_back(Completion {
                key: job_key,
                result,
            });
        });

        if let Err(error) = scheduled {
            // Keep the one-completion-per-submission promise
            self.shared
                .completed
                .lock()
                .push_back(Completion { key, result: Err(error) });
        }

        Submission::Queued
    }

    /// Takes every buffered completion, oldest first.
    ///
    /// The result lock is held only long enough to swap the buffer out; the
    /// drained keys become submittable again.
    pub fn drain(&self) -> Vec<Completion<K, T>> {
        let batch: Vec<Completion<K, T>> = {
            let mut completed = self.shared.completed.lock();
            completed.drain(..).collect()
        };

        if !batch.is_empty() {
            let mut in_flight = self.shared.in_flight.lock();
            for completion in &batch {
                in_flight.remove(&completion.key);
            }
        }

        batch
    }

    /// Drains the queue and calls `on_done` for each completion in order.
    ///
    /// Meant to be called once per owning tick. Returns how many completions
    /// were delivered.
    pub fn poll<F>(&self, mut on_done: F) -> usize
    where
        F: FnMut(Completion<K, T>),
    {
        let batch = self.drain();
        let delivered = batch.len();
        for completion in batch {
            on_done(completion);
        }
        delivered
    }

    /// Returns true if `key` was submitted and has not been drained yet.
    #[must_use]
    pub fn is_in_flight(&self, key: &K) -> bool {
        self.shared.in_flight.lock().contains(key)
    }

    /// Number of submitted tasks not yet drained.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.shared.in_flight.lock().len()
    }

    /// Number of completions waiting for the next drain.
    #[must_use]
    pub fn ready_count(&self) -> usize {
        self.shared.completed.lock().len()
    }

    /// The pool this queue submits to.
    #[must_use]
    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for_ready<K, T>(queue: &TaskQueue<K, T>, expected: usize)
    where
        K: Eq + Hash + Clone + Send + 'static,
        T: Send + 'static,
    {
        let deadline = Instant::now() + Duration::from_secs(10);
        while queue.ready_count() < expected {
            assert!(Instant::now() < deadline, "Timed out waiting for completions");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_drain_delivers_all_in_enqueue_order() {
        // One worker: completion order equals submission order
        let pool = Arc::new(WorkerPool::new(1).unwrap());
        let queue: TaskQueue<u32, u32> = TaskQueue::new(pool);

        for i in 0..50 {
            assert_eq!(queue.submit(i, move || Ok(i * 2)), Submission::Queued);
        }
        wait_for_ready(&queue, 50);

        let mut seen = Vec::new();
        let delivered = queue.poll(|done| {
            seen.push((done.key, done.result.unwrap()));
        });

        assert_eq!(delivered, 50);
        let expected: Vec<_> = (0..50).map(|i| (i, i * 2)).collect();
        assert_eq!(seen, expected);

        // Exactly once
        assert_eq!(queue.poll(|_| panic!("already delivered")), 0);
        assert_eq!(queue.in_flight_count(), 0);
    }

    #[test]
    fn test_duplicate_key_suppressed_until_drained() {
        let pool = Arc::new(WorkerPool::new(2).unwrap());
        let queue: TaskQueue<&'static str, u8> = TaskQueue::new(pool);

        assert_eq!(queue.submit("a", || Ok(1)), Submission::Queued);
        assert_eq!(queue.submit("a", || Ok(2)), Submission::Duplicate);
        assert!(queue.is_in_flight(&"a"));

        wait_for_ready(&queue, 1);
        // Still in flight: finished but not drained
        assert_eq!(queue.submit("a", || Ok(3)), Submission::Duplicate);

        let batch = queue.drain();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].result, Ok(1));

        assert!(!queue.is_in_flight(&"a"));
        assert_eq!(queue.submit("a", || Ok(4)), Submission::Queued);
    }

    #[test]
    fn test_failure_and_panic_are_reported() {
        let pool = Arc::new(WorkerPool::new(1).unwrap());
        let queue: TaskQueue<u8, u8> = TaskQueue::new(pool);

        queue.submit(1, || Err(TaskError::Failed("disk on fire".into())));
        queue.submit(2, || panic!("boom"));
        queue.submit(3, || Ok(3));
        wait_for_ready(&queue, 3);

        let batch = queue.drain();
        assert_eq!(batch[0].result, Err(TaskError::Failed("disk on fire".into())));
        assert_eq!(batch[1].result, Err(TaskError::WorkerPanicked));
        // The worker survived the panic
        assert_eq!(batch[2].result, Ok(3));
    }

    #[test]
    fn test_submit_after_shutdown_still_completes() {
        let pool = Arc::new(WorkerPool::new(1).unwrap());
        pool.shutdown();
        let queue: TaskQueue<u8, u8> = TaskQueue::new(pool);

        assert_eq!(queue.submit(9, || Ok(9)), Submission::Queued);
        let batch = queue.drain();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].result, Err(TaskError::PoolShutDown));
    }

    #[test]
    fn test_queues_sharing_a_pool_are_independent() {
        let pool = Arc::new(WorkerPool::new(2).unwrap());
        let fields: TaskQueue<u8, &'static str> = TaskQueue::new(Arc::clone(&pool));
        let meshes: TaskQueue<u8, &'static str> = TaskQueue::new(Arc::clone(&pool));

        // Same key in both queues is not a duplicate
        assert_eq!(fields.submit(1, || Ok("field")), Submission::Queued);
        assert_eq!(meshes.submit(1, || Ok("mesh")), Submission::Queued);

        wait_for_ready(&fields, 1);
        wait_for_ready(&meshes, 1);

        assert_eq!(fields.drain()[0].result, Ok("field"));
        assert_eq!(meshes.drain()[0].result, Ok("mesh"));
    }
}
