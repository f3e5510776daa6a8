//! # Worker Pool
//!
//! Fixed number of threads fed from one job channel.
//!
//! Replaces one-thread-per-request spawning: a fast viewer sweep over
//! never-seen terrain queues jobs instead of spawning unbounded threads.

use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;

use crate::error::{TaskError, TaskResult};

/// A unit of work executed on a pool thread.
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Bounded pool of worker threads.
///
/// Jobs are executed in submission order by whichever worker is free.
/// Dropping the pool closes the channel and joins every worker after the
/// already-queued jobs have run.
///
/// # Example
///
/// ```rust,ignore
/// let pool = WorkerPool::new(4)?;
/// pool.execute(|| println!("on a worker"))?;
/// ```
pub struct WorkerPool {
    /// Job channel. `None` once the pool has been shut down.
    sender: Mutex<Option<Sender<Job>>>,
    /// Worker thread handles, joined on shutdown.
    workers: Mutex<Vec<JoinHandle<()>>>,
    /// Number of worker threads.
    thread_count: usize,
}

impl WorkerPool {
    /// Creates a pool with `threads` workers.
    ///
    /// `0` means "one per available core".
    ///
    /// # Errors
    ///
    /// Returns `TaskError::SpawnFailed` if a worker thread cannot be started.
    pub fn new(threads: usize) -> TaskResult<Self> {
        let thread_count = if threads > 0 {
            threads
        } else {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        };

        let (sender, receiver) = unbounded::<Job>();
        let mut workers = Vec::with_capacity(thread_count);

        for index in 0..thread_count {
            let receiver = receiver.clone();
            let handle = std::thread::Builder::new()
                .name(format!("endless-worker-{index}"))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        job();
                    }
                })
                .map_err(|e| TaskError::SpawnFailed(e.to_string()))?;
            workers.push(handle);
        }

        tracing::debug!("Worker pool started with {} threads", thread_count);

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            thread_count,
        })
    }

    /// Returns the number of worker threads.
    #[inline]
    #[must_use]
    pub const fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Queues a job for execution on a worker.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::PoolShutDown` if the pool no longer accepts work.
    pub fn execute<F>(&self, job: F) -> TaskResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let guard = self.sender.lock();
        let sender = guard.as_ref().ok_or(TaskError::PoolShutDown)?;
        sender
            .send(Box::new(job))
            .map_err(|_| TaskError::PoolShutDown)
    }

    /// Stops accepting work and joins all workers.
    ///
    /// Jobs already queued still run to completion. Calling this twice is a
    /// no-op.
    pub fn shutdown(&self) {
        // Dropping the last sender ends every worker's recv loop
        drop(self.sender.lock().take());

        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        if workers.is_empty() {
            return;
        }

        for handle in workers {
            if handle.join().is_err() {
                tracing::warn!("Worker thread exited with a panic");
            }
        }
        tracing::debug!("Worker pool stopped");
    }

    /// Returns true once `shutdown` has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.sender.lock().is_none()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
