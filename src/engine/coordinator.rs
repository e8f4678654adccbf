//! Tally coordinator - orchestrates the parallel run
//!
//! The coordinator is responsible for:
//! - Populating the work queue before any worker starts
//! - Spawning the fixed-size worker pool
//! - Blocking on the completion gate with a bounded shutdown timeout
//! - Joining workers and assembling the final run report
//!
//! The queue is fully populated before the pool starts, so an empty
//! claim always means "drained", never "not produced yet".

use crate::config::TallyConfig;
use crate::engine::accumulator::SharedAccumulator;
use crate::engine::gate::CompletionGate;
use crate::engine::queue::{QueueStats, WorkItem, WorkQueue};
use crate::engine::worker::{FailureLog, ItemProcessor, Worker, WorkerContext};
use crate::error::{ItemError, PoolError, Result, TallyError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often the bounded wait re-checks the interrupt flag
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Result of a completed run
#[derive(Debug)]
pub struct TallyResult {
    /// Final grand total across all successful items
    pub total: i64,

    /// Items enqueued at the start
    pub items_enqueued: usize,

    /// Items processed successfully
    pub items_done: u64,

    /// Items that failed processing
    pub items_failed: u64,

    /// The recorded failures, in arrival order
    pub failures: Vec<ItemError>,

    /// Wall time for the run
    pub duration: Duration,

    /// Whether the run drained fully (vs was interrupted)
    pub completed: bool,
}

/// Live view of a run for progress display
#[derive(Debug, Clone)]
pub struct TallyProgress {
    /// Items claimed so far
    pub claimed: u64,

    /// Completions still outstanding on the gate
    pub outstanding: usize,

    /// Total items enqueued
    pub total_items: usize,

    /// Current (partial) accumulator value
    pub running_total: i64,
}

/// Cloneable handle for observing a run in flight
#[derive(Clone)]
pub struct TallyMonitor {
    queue_stats: Arc<QueueStats>,
    gate: Arc<CompletionGate>,
    accumulator: Arc<SharedAccumulator>,
    total_items: usize,
}

impl TallyMonitor {
    /// Snapshot the current progress
    pub fn progress(&self) -> TallyProgress {
        TallyProgress {
            claimed: self.queue_stats.claimed_count(),
            outstanding: self.gate.outstanding(),
            total_items: self.total_items,
            running_total: self.accumulator.value(),
        }
    }

    /// True once every expected completion has been signaled
    pub fn is_complete(&self) -> bool {
        self.gate.outstanding() == 0
    }
}

/// Coordinates one parallel tally run
pub struct TallyCoordinator {
    config: Arc<TallyConfig>,
    queue: WorkQueue,
    items_total: usize,
    accumulator: Arc<SharedAccumulator>,
    gate: Arc<CompletionGate>,
    failures: Arc<FailureLog>,
    workers: Vec<Worker>,
    shutdown: Arc<AtomicBool>,
    processor: Arc<ItemProcessor>,
}

impl TallyCoordinator {
    /// Create a coordinator for the given items and processing step
    pub fn new(
        config: TallyConfig,
        items: Vec<WorkItem>,
        processor: Arc<ItemProcessor>,
    ) -> Self {
        // The gate counts items, never workers: a worker that finds the
        // queue empty terminates without signaling.
        let expected = config.expected_completions.unwrap_or(items.len());
        let items_total = items.len();
        let queue = WorkQueue::from_items(items);

        Self {
            config: Arc::new(config),
            queue,
            items_total,
            accumulator: Arc::new(SharedAccumulator::new()),
            gate: Arc::new(CompletionGate::new(expected)),
            failures: Arc::new(FailureLog::new()),
            workers: Vec::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
            processor,
        }
    }

    /// Get a clone of the shutdown flag (for signal handlers)
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Get an observation handle for progress display
    pub fn monitor(&self) -> TallyMonitor {
        TallyMonitor {
            queue_stats: self.queue.stats(),
            gate: Arc::clone(&self.gate),
            accumulator: Arc::clone(&self.accumulator),
            // Fixed at construction: the live queue length shrinks as
            // workers claim.
            total_items: self.items_total,
        }
    }

    /// Run the tally to completion
    ///
    /// Blocks until the gate opens, the shutdown timeout expires, or an
    /// interrupt is requested. A timeout is fatal and distinct from a
    /// slow-but-successful run; stragglers past the deadline are
    /// abandoned best-effort rather than joined.
    pub fn run(mut self) -> Result<TallyResult> {
        let start = Instant::now();
        let items_enqueued = self.items_total;

        info!(
            items = items_enqueued,
            workers = self.config.worker_count,
            expected = self.gate.expected(),
            "Starting tally run"
        );

        self.spawn_workers()?;

        let completed = match self.wait_for_gate(start) {
            WaitOutcome::Complete => true,
            WaitOutcome::Interrupted => {
                info!("Interrupt received, draining workers");
                false
            }
            WaitOutcome::TimedOut => {
                let outstanding = self.gate.outstanding();
                warn!(
                    outstanding,
                    timeout = ?self.config.shutdown_timeout,
                    "Pool failed to drain, abandoning stragglers"
                );
                self.shutdown.store(true, Ordering::SeqCst);
                return Err(TallyError::Pool(PoolError::ShutdownTimeout {
                    timeout: self.config.shutdown_timeout,
                    outstanding,
                }));
            }
        };

        // Stop any worker still looping (interrupt path) and join. The
        // join is bounded by the same shutdown-timeout budget as the
        // gate wait, so an interrupt cannot hang behind a worker stuck
        // in external I/O.
        self.shutdown.store(true, Ordering::SeqCst);
        let (items_done, items_failed) =
            self.join_workers(start + self.config.shutdown_timeout)?;

        let duration = start.elapsed();
        let total = self.accumulator.value();

        info!(
            total,
            done = items_done,
            failed = items_failed,
            duration_ms = duration.as_millis() as u64,
            "Tally run finished"
        );

        Ok(TallyResult {
            total,
            items_enqueued,
            items_done,
            items_failed,
            failures: self.failures.snapshot(),
            duration,
            completed,
        })
    }

    /// Spawn the fixed-size worker pool
    fn spawn_workers(&mut self) -> Result<()> {
        for id in 0..self.config.worker_count {
            let ctx = WorkerContext {
                claimer: self.queue.claimer(),
                accumulator: Arc::clone(&self.accumulator),
                gate: Arc::clone(&self.gate),
                failures: Arc::clone(&self.failures),
                shutdown: Arc::clone(&self.shutdown),
                processor: Arc::clone(&self.processor),
            };
            self.workers.push(Worker::spawn(id, ctx)?);
        }

        debug!(count = self.workers.len(), "Workers spawned");
        Ok(())
    }

    /// Wait for the gate, bounded by the shutdown timeout, in short
    /// slices so an interrupt is noticed promptly
    fn wait_for_gate(&self, start: Instant) -> WaitOutcome {
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                return WaitOutcome::Interrupted;
            }
            if self.gate.await_all_timeout(WAIT_SLICE) {
                return WaitOutcome::Complete;
            }
            if start.elapsed() >= self.config.shutdown_timeout {
                return WaitOutcome::TimedOut;
            }
        }
    }

    /// Join all worker threads and collect final stats
    ///
    /// Each worker's counters are read only after it has joined (or been
    /// abandoned at the deadline), so an item finishing mid-shutdown is
    /// counted consistently with the accumulator and the failure log.
    fn join_workers(&mut self, deadline: Instant) -> Result<(u64, u64)> {
        let workers = std::mem::take(&mut self.workers);
        let mut items_done = 0u64;
        let mut items_failed = 0u64;

        for worker in workers {
            let id = worker.id();
            let stats = worker.stats_handle();
            match worker.join_by(deadline) {
                Ok(true) => {}
                Ok(false) => {
                    warn!(worker = id, "Worker still busy at deadline, abandoning");
                }
                Err(e) => {
                    warn!(error = %e, "Worker failed to join cleanly");
                    return Err(e.into());
                }
            }
            items_done += stats.items_done.load(Ordering::Relaxed);
            items_failed += stats.items_failed.load(Ordering::Relaxed);
        }

        Ok((items_done, items_failed))
    }
}

enum WaitOutcome {
    Complete,
    Interrupted,
    TimedOut,
}
