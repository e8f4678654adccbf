//! Integration tests for file-tally
//!
//! These exercise the whole engine against real files on disk: exact
//! aggregation across pool sizes and fuzzed interleavings, exactly-once
//! claiming, failure isolation, and both configurations of the lock
//! ordering discipline under bounded timeouts.

use file_tally::config::TallyConfig;
use file_tally::datafile::{file_processor, generate_sample_files, sum_file};
use file_tally::engine::{
    CompletionGate, ItemProcessor, TallyCoordinator, WorkItem, WorkQueue,
};
use file_tally::error::{ItemError, TallyError};
use file_tally::locking::{ExchangePair, OrderPolicy};
use rand::Rng;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

fn config(workers: usize) -> TallyConfig {
    TallyConfig {
        worker_count: workers,
        expected_completions: None,
        shutdown_timeout: Duration::from_secs(10),
        show_progress: false,
        verbose: false,
    }
}

fn items_for(paths: &[PathBuf]) -> Vec<WorkItem> {
    paths
        .iter()
        .enumerate()
        .map(|(i, p)| WorkItem::new(i, p.clone()))
        .collect()
}

#[test]
fn canonical_five_files_two_workers_totals_325() {
    let dir = tempdir().unwrap();
    let paths = generate_sample_files(dir.path(), 5).unwrap();

    // File i holds 5(i-1)+1 ..= 5(i-1)+5, so the combined range is 1..=25
    let expected: i64 = (1..=25).sum();
    assert_eq!(expected, 325);

    let coordinator = TallyCoordinator::new(config(2), items_for(&paths), file_processor());
    let result = coordinator.run().unwrap();

    assert!(result.completed, "gate must open before the total is read");
    assert_eq!(result.total, 325);
    assert_eq!(result.items_done, 5);
    assert_eq!(result.items_failed, 0);
}

#[test]
fn empty_queue_with_zero_expected_returns_immediately() {
    let coordinator = TallyCoordinator::new(config(3), Vec::new(), file_processor());
    let result = coordinator.run().unwrap();

    assert!(result.completed);
    assert_eq!(result.total, 0);
    assert_eq!(result.items_enqueued, 0);
    assert_eq!(result.items_done, 0);
}

#[test]
fn total_is_exact_for_any_pool_size() {
    let dir = tempdir().unwrap();
    let paths = generate_sample_files(dir.path(), 12).unwrap();
    let expected: i64 = paths.iter().map(|p| sum_file(p).unwrap()).sum();

    for workers in [1, 2, 4, 8, 16] {
        let coordinator =
            TallyCoordinator::new(config(workers), items_for(&paths), file_processor());
        let result = coordinator.run().unwrap();

        assert_eq!(
            result.total, expected,
            "pool size {workers} changed the total"
        );
        assert_eq!(result.items_done, 12);
    }
}

#[test]
fn total_is_exact_under_randomized_delays() {
    // Fuzz interleavings: every item contributes its index but sleeps a
    // random amount first, so claim and fold orders vary run to run.
    let n = 40usize;
    let items: Vec<_> = (0..n).map(|i| WorkItem::new(i, format!("item-{i}"))).collect();
    let expected: i64 = (0..n as i64).sum();

    let processor: Arc<ItemProcessor> = Arc::new(|item| {
        let delay = rand::thread_rng().gen_range(0..3);
        thread::sleep(Duration::from_millis(delay));
        Ok(item.index as i64)
    });

    for _ in 0..5 {
        let coordinator = TallyCoordinator::new(config(4), items.clone(), Arc::clone(&processor));
        let result = coordinator.run().unwrap();
        assert_eq!(result.total, expected);
        assert_eq!(result.items_done, n as u64);
    }
}

#[test]
fn every_item_claimed_exactly_once_across_pool() {
    let n = 100usize;
    let queue = WorkQueue::from_items((0..n).map(|i| WorkItem::new(i, format!("f{i}"))));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let claimer = queue.claimer();
            thread::spawn(move || {
                let mut seen = Vec::new();
                while let Some(item) = claimer.try_claim() {
                    // Delay between claims so every worker gets a share
                    thread::sleep(Duration::from_micros(200));
                    seen.push(item.index);
                }
                seen
            })
        })
        .collect();

    let mut all = HashSet::new();
    for handle in handles {
        for index in handle.join().unwrap() {
            assert!(all.insert(index), "item {index} delivered twice");
        }
    }

    assert_eq!(all.len(), n, "every item must be claimed");
    assert!(queue.claimer().try_claim().is_none(), "queue fully drained");
}

#[test]
fn failed_items_are_reported_without_stalling_the_run() {
    let dir = tempdir().unwrap();
    let paths = generate_sample_files(dir.path(), 3).unwrap();

    let mut items = items_for(&paths);
    items.push(WorkItem::new(3, dir.path().join("missing.txt")));
    let bad = dir.path().join("garbled.txt");
    std::fs::write(&bad, "12 nonsense 14").unwrap();
    items.push(WorkItem::new(4, bad));

    let coordinator = TallyCoordinator::new(config(2), items, file_processor());
    let result = coordinator.run().unwrap();

    assert!(result.completed, "failures must not stall the gate");
    // 1..=15 from the three good files
    assert_eq!(result.total, (1..=15).sum::<i64>());
    assert_eq!(result.items_done, 3);
    assert_eq!(result.items_failed, 2);

    let kinds: Vec<_> = result.failures.iter().collect();
    assert!(kinds.iter().any(|e| matches!(e, ItemError::ReadFailed { .. })));
    assert!(kinds.iter().any(|e| matches!(e, ItemError::ParseFailed { .. })));
}

#[test]
fn stalled_pool_surfaces_timeout_not_hang() {
    let items = vec![WorkItem::new(0, "never-finishes")];
    let processor: Arc<ItemProcessor> = Arc::new(|_| {
        thread::sleep(Duration::from_secs(60));
        Ok(0)
    });

    let mut cfg = config(1);
    cfg.shutdown_timeout = Duration::from_millis(400);

    let err = TallyCoordinator::new(cfg, items, processor)
        .run()
        .unwrap_err();
    assert!(matches!(err, TallyError::Pool(_)));
}

#[test]
fn gate_with_zero_expected_never_blocks() {
    let gate = CompletionGate::new(0);
    gate.await_all();
    assert!(gate.await_all_timeout(Duration::from_millis(1)));
}

#[test]
fn opposite_order_acquisition_deadlocks_within_timeout() {
    let pair = ExchangePair::new(50, 50);
    let outcome = pair
        .run_transfers(
            OrderPolicy::AsGiven,
            5,
            Duration::from_millis(200),
            Duration::from_millis(900),
        )
        .unwrap();

    assert!(
        !outcome.completed,
        "opposite-order acquisition with a hold window must hang"
    );
}

#[test]
fn ranked_acquisition_completes_under_same_conditions() {
    let pair = ExchangePair::new(50, 50);
    let outcome = pair
        .run_transfers(
            OrderPolicy::Ranked,
            5,
            Duration::from_millis(200),
            Duration::from_secs(5),
        )
        .unwrap();

    assert!(outcome.completed, "rank-ordered acquisition must not deadlock");
    // Equal opposite transfers leave the balances unchanged
    assert_eq!(outcome.left, 50);
    assert_eq!(outcome.right, 50);
}
