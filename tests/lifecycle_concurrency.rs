//! Concurrent acquire/release against the process lifecycle.

use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use rpc_embed::lifecycle::{LifecycleError, ProcessLifecycle, SubsystemRegistry};

mod common;

use common::RecordingSubsystem;

fn lifecycle(log: &Arc<Mutex<Vec<String>>>) -> ProcessLifecycle {
    let registry = SubsystemRegistry::new()
        .register(RecordingSubsystem::new("first", log.clone()))
        .register(RecordingSubsystem::new("second", log.clone()));
    ProcessLifecycle::new(registry)
}

#[test]
fn test_three_acquires_three_releases() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let lifecycle = lifecycle(&log);

    for _ in 0..3 {
        lifecycle.acquire().unwrap();
    }
    assert_eq!(lifecycle.count(), 3);
    for _ in 0..3 {
        lifecycle.release();
    }

    assert_eq!(lifecycle.count(), 0);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["first:start", "second:start", "second:stop", "first:stop"]
    );
}

#[test]
fn test_concurrent_balanced_callers_start_and_stop_once() {
    const THREADS: usize = 16;
    const ROUNDS: usize = 50;

    let log = Arc::new(Mutex::new(Vec::new()));
    let lifecycle = Arc::new(lifecycle(&log));
    // The outer reference keeps the runtime up while the threads churn.
    lifecycle.acquire().unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let lifecycle = lifecycle.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..ROUNDS {
                    lifecycle.acquire().unwrap();
                    assert!(lifecycle.is_running());
                    lifecycle.release();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(lifecycle.count(), 1);
    lifecycle.release();
    assert_eq!(lifecycle.count(), 0);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["first:start", "second:start", "second:stop", "first:stop"]
    );
}

#[test]
fn test_concurrent_cycles_alternate_start_and_stop() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let lifecycle = Arc::new(lifecycle(&log));

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let lifecycle = lifecycle.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    lifecycle.acquire().unwrap();
                    lifecycle.release();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(lifecycle.count(), 0);
    let log = log.lock().unwrap();
    assert!(!log.is_empty());
    for cycle in log.chunks(4) {
        assert_eq!(cycle, ["first:start", "second:start", "second:stop", "first:stop"]);
    }
}

#[test]
fn test_over_release_is_imbalance() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let lifecycle = lifecycle(&log);

    assert!(matches!(lifecycle.try_release(), Err(LifecycleError::Imbalance)));
    lifecycle.acquire().unwrap();
    lifecycle.release();
    assert!(matches!(lifecycle.try_release(), Err(LifecycleError::Imbalance)));
    assert_eq!(lifecycle.count(), 0);
}

#[test]
#[should_panic(expected = "lifecycle imbalance")]
fn test_over_release_panics() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let lifecycle = lifecycle(&log);
    lifecycle.acquire().unwrap();
    lifecycle.release();
    lifecycle.release();
}

#[test]
fn test_failed_start_rolls_back() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = SubsystemRegistry::new()
        .register(RecordingSubsystem::new("first", log.clone()))
        .register(RecordingSubsystem::failing("broken", log.clone()));
    let lifecycle = ProcessLifecycle::new(registry);

    let err = lifecycle.acquire().unwrap_err();
    assert!(matches!(err, LifecycleError::SubsystemStart { name: "broken", .. }));
    assert_eq!(lifecycle.count(), 0);
    assert_eq!(*log.lock().unwrap(), vec!["first:start", "first:stop"]);
}
