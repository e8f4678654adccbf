//! Shared work queue with exactly-once claiming
//!
//! The queue is populated once by the driver before the pool starts and
//! only drained afterwards. Claiming never blocks: an empty queue is the
//! normal drain signal telling a worker to terminate, not an error.
//!
//! Built on a crossbeam channel so single-consumer-per-item delivery is
//! a property of the queue itself rather than a convention callers have
//! to uphold. The channel hands each item to exactly one receiver, which
//! is precisely the claim contract.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One unit of work: a data file to sum
///
/// Immutable once enqueued. Ownership transfers to the claiming worker
/// and the item is never re-enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Position in the original input list (stable across the run)
    pub index: usize,

    /// Path of the file to process
    pub path: PathBuf,
}

impl WorkItem {
    /// Create a new work item
    pub fn new(index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            path: path.into(),
        }
    }
}

/// Counters for queue activity
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total items enqueued
    pub enqueued: AtomicU64,

    /// Total items claimed by workers
    pub claimed: AtomicU64,
}

impl QueueStats {
    /// Number of items claimed so far
    pub fn claimed_count(&self) -> u64 {
        self.claimed.load(Ordering::Relaxed)
    }

    /// Number of items enqueued
    pub fn enqueued_count(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }
}

/// Shared pending-work container
pub struct WorkQueue {
    sender: Sender<WorkItem>,
    receiver: Receiver<WorkItem>,
    stats: Arc<QueueStats>,
}

impl WorkQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            stats: Arc::new(QueueStats::default()),
        }
    }

    /// Create a queue pre-populated with items
    pub fn from_items(items: impl IntoIterator<Item = WorkItem>) -> Self {
        let queue = Self::new();
        for item in items {
            queue.enqueue(item);
        }
        queue
    }

    /// Add an item to the queue
    ///
    /// Only the driver enqueues, and only before the pool starts; the
    /// channel is unbounded so this cannot block or fail while the
    /// queue itself is alive.
    pub fn enqueue(&self, item: WorkItem) {
        // Receiver lives in self, so the channel cannot be disconnected here.
        let _ = self.sender.send(item);
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a claim handle for a worker (clone one per worker)
    pub fn claimer(&self) -> WorkClaimer {
        WorkClaimer {
            receiver: self.receiver.clone(),
            stats: Arc::clone(&self.stats),
        }
    }

    /// Get queue statistics
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Get current queue length
    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle a worker uses to claim items
#[derive(Clone)]
pub struct WorkClaimer {
    receiver: Receiver<WorkItem>,
    stats: Arc<QueueStats>,
}

impl WorkClaimer {
    /// Try to claim one item without blocking
    ///
    /// Returns `None` when the queue is drained - the worker's signal to
    /// terminate. Each enqueued item is returned to exactly one caller.
    pub fn try_claim(&self) -> Option<WorkItem> {
        match self.receiver.try_recv() {
            Ok(item) => {
                self.stats.claimed.fetch_add(1, Ordering::Relaxed);
                Some(item)
            }
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_claim_returns_enqueued_item() {
        let queue = WorkQueue::new();
        queue.enqueue(WorkItem::new(0, "file1.txt"));

        assert!(!queue.is_empty());
        assert_eq!(queue.len(), 1);

        let claimer = queue.claimer();
        let item = claimer.try_claim().unwrap();
        assert_eq!(item.index, 0);
        assert_eq!(item.path, PathBuf::from("file1.txt"));
    }

    #[test]
    fn test_claim_on_empty_is_none() {
        let queue = WorkQueue::new();
        let claimer = queue.claimer();
        assert!(claimer.try_claim().is_none());

        // Still None after a drain, not an error
        queue.enqueue(WorkItem::new(0, "a"));
        claimer.try_claim().unwrap();
        assert!(claimer.try_claim().is_none());
    }

    #[test]
    fn test_stats_track_enqueue_and_claim() {
        let queue = WorkQueue::from_items((0..4).map(|i| WorkItem::new(i, format!("f{i}"))));
        let claimer = queue.claimer();

        claimer.try_claim().unwrap();
        claimer.try_claim().unwrap();

        let stats = queue.stats();
        assert_eq!(stats.enqueued_count(), 4);
        assert_eq!(stats.claimed_count(), 2);
    }

    #[test]
    fn test_exactly_once_across_threads() {
        let n = 200;
        let queue = WorkQueue::from_items((0..n).map(|i| WorkItem::new(i, format!("f{i}"))));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let claimer = queue.claimer();
                thread::spawn(move || {
                    let mut claimed = Vec::new();
                    while let Some(item) = claimer.try_claim() {
                        claimed.push(item.index);
                    }
                    claimed
                })
            })
            .collect();

        let mut seen = HashSet::new();
        let mut total = 0;
        for handle in handles {
            for index in handle.join().unwrap() {
                assert!(seen.insert(index), "item {index} claimed twice");
                total += 1;
            }
        }

        assert_eq!(total, n, "every item claimed exactly once");
        assert_eq!(queue.stats().claimed_count(), n as u64);
    }
}
