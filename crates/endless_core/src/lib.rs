//! # Endless Core
//!
//! Engine-agnostic plumbing for the terrain streamer:
//! - A bounded worker pool that runs pure generation jobs off the owning thread
//! - Result queues that hand finished artifacts back to one owning tick
//! - Small math vectors shared by noise, meshing and streaming
//!
//! ## Threading Rules
//!
//! 1. **Workers never touch shared state** - jobs are pure over their inputs
//! 2. **One owner mutates** - results are drained and applied on the owning thread
//! 3. **No blocking** - the owner polls, it never waits on in-flight work
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use endless_core::{TaskQueue, WorkerPool};
//!
//! let pool = Arc::new(WorkerPool::new(4)?);
//! let queue: TaskQueue<u32, u64> = TaskQueue::new(Arc::clone(&pool));
//!
//! queue.submit(7, || Ok(7 * 7));
//!
//! // Once per frame, on the owning thread
//! queue.poll(|done| println!("{} -> {:?}", done.key, done.result));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod math;
pub mod sync;

pub use error::{TaskError, TaskResult};
pub use math::{Vec2, Vec3};
pub use sync::{Completion, Submission, TaskQueue, WorkerPool};
