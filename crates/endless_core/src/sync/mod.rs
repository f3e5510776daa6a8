//! # Background Work and Result Hand-off
//!
//! ## The Problem
//!
//! ```text
//! Owning thread (tick):   mutates chunk map, never blocks
//! Worker threads:         generate fields and meshes (slow, pure)
//!
//! Workers writing into the chunk map: RACE CONDITION
//! Owner waiting on workers:           FRAME STALLS
//! ```
//!
//! ## The Solution: Queue and Drain
//!
//! ```text
//!   submit(key, job) ──► WorkerPool (N threads) ──► job()
//!                                                     │
//!                                   lock ◄────────────┘ push Completion
//!   tick: lock, take all, unlock ──► on_done(completion) in FIFO order
//! ```
//!
//! The lock is held only for a push or a swap of the whole queue, so a slow
//! callback on the owning thread never blocks a worker. A per-queue in-flight
//! set suppresses duplicate requests for the same key until the owner has
//! drained the result.

mod task_queue;
mod worker_pool;

pub use task_queue::{Completion, Submission, TaskQueue};
pub use worker_pool::WorkerPool;
