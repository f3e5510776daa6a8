//! # Hand-off Integration Test
//!
//! Many producers, one owning consumer: every result arrives exactly once
//! and nothing is lost while the owner keeps ticking.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use endless_core::{Submission, TaskQueue, WorkerPool};

/// Test: 1,000 jobs across 4 workers, drained by a ticking owner.
#[test]
fn test_owner_tick_receives_every_result_once() {
    let pool = Arc::new(WorkerPool::new(4).unwrap());
    let queue: TaskQueue<u32, u32> = TaskQueue::new(pool);

    for i in 0..1_000 {
        assert_eq!(queue.submit(i, move || Ok(i + 1)), Submission::Queued);
    }

    let mut seen = HashSet::new();
    let deadline = Instant::now() + Duration::from_secs(30);

    // Owner loop: poll once per "frame", never block on the workers
    while seen.len() < 1_000 {
        assert!(Instant::now() < deadline, "Owner starved: {} results", seen.len());
        queue.poll(|done| {
            assert_eq!(done.result, Ok(done.key + 1));
            assert!(seen.insert(done.key), "Duplicate delivery for {}", done.key);
        });
        std::thread::sleep(Duration::from_millis(1));
    }

    assert_eq!(queue.in_flight_count(), 0);
    println!("Delivered {} results", seen.len());
}

/// Test: re-submitting the same keys while they are in flight runs nothing extra.
#[test]
fn test_dedup_under_rapid_resubmission() {
    let pool = Arc::new(WorkerPool::new(2).unwrap());
    let queue: TaskQueue<u32, ()> = TaskQueue::new(pool);

    let mut queued = 0;
    for _round in 0..20 {
        for key in 0..10 {
            if queue.submit(key, || Ok(())) == Submission::Queued {
                queued += 1;
            }
        }
    }
    assert_eq!(queued, 10, "Only the first submission per key should queue");

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut delivered = 0;
    while delivered < 10 {
        assert!(Instant::now() < deadline);
        delivered += queue.poll(|_| {});
        std::thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(delivered, 10);
}
