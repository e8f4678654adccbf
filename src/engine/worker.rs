//! Worker thread logic for the tally pool
//!
//! Each worker loops: claim one item from the shared queue, run the item
//! processor on it (file I/O, not lock-protected), fold the contribution
//! into the shared accumulator, signal the completion gate. A claim that
//! finds the queue empty terminates the worker.
//!
//! Two locks exist in this loop (queue, accumulator) but they are held
//! in strictly disjoint phases; a worker never holds both at once. The
//! locking module's ordering discipline is only needed by code that must
//! hold several locks simultaneously.

use crate::engine::accumulator::SharedAccumulator;
use crate::engine::gate::CompletionGate;
use crate::engine::queue::{WorkClaimer, WorkItem};
use crate::error::{ItemError, ItemOutcome, ItemResult, PoolError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Polling interval for the deadline-bounded join
const JOIN_POLL: Duration = Duration::from_millis(10);

/// The processing step applied to each claimed item
///
/// External collaborator seam: the engine knows nothing about file
/// formats, only that an item yields a numeric contribution or fails.
pub type ItemProcessor = dyn Fn(&WorkItem) -> ItemResult<i64> + Send + Sync;

/// Lifecycle phase of a worker, for trace-level diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    /// Spawned, not yet claiming
    Idle,
    /// Attempting to claim an item
    Claiming,
    /// Running the item processor
    Processing,
    /// Folding the result and signaling the gate
    Reporting,
    /// Claim returned empty; worker is done
    Terminated,
}

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Items processed successfully
    pub items_done: AtomicU64,

    /// Items that failed processing
    pub items_failed: AtomicU64,
}

impl WorkerStats {
    fn record_done(&self) {
        self.items_done.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failed(&self) {
        self.items_failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Shared record of per-item failures across the pool
///
/// Failures are collected rather than propagated so the driver can report
/// them after the run without any worker aborting its siblings.
#[derive(Debug, Default)]
pub struct FailureLog {
    failures: Mutex<Vec<ItemError>>,
}

impl FailureLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one failure
    pub fn record(&self, error: ItemError) {
        self.lock().push(error);
    }

    /// Number of failures recorded so far
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if nothing failed
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Take a snapshot of all recorded failures
    pub fn snapshot(&self) -> Vec<ItemError> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ItemError>> {
        match self.failures.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Everything a worker needs, bundled for spawning
pub struct WorkerContext {
    /// Claim handle on the shared queue
    pub claimer: WorkClaimer,

    /// Shared grand total
    pub accumulator: Arc<SharedAccumulator>,

    /// Completion gate signaled once per claimed item
    pub gate: Arc<CompletionGate>,

    /// Shared failure record
    pub failures: Arc<FailureLog>,

    /// Cooperative cancellation flag set by the driver
    pub shutdown: Arc<AtomicBool>,

    /// The processing step
    pub processor: Arc<ItemProcessor>,
}

/// A spawned worker thread
pub struct Worker {
    id: usize,
    handle: Option<JoinHandle<Result<(), PoolError>>>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn(id: usize, ctx: WorkerContext) -> Result<Self, PoolError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(format!("tally-{id}"))
            .spawn(move || worker_loop(id, ctx, stats_clone))
            .map_err(|e| PoolError::SpawnFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Get a shared handle on this worker's statistics
    ///
    /// Stays valid after the worker is joined or abandoned, so callers
    /// can read counts once the thread is actually done.
    pub fn stats_handle(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), PoolError> {
        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(_) => Err(PoolError::Panicked { id: self.id }),
            },
            None => Ok(()),
        }
    }

    /// Wait for the worker to finish, giving up at `deadline`
    ///
    /// Returns `Ok(true)` once the worker has joined and `Ok(false)` if
    /// it was still running at the deadline, in which case the thread is
    /// abandoned best-effort. A worker that is already finished joins
    /// even when the deadline has passed.
    pub fn join_by(mut self, deadline: Instant) -> Result<bool, PoolError> {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => return Ok(true),
        };

        while !handle.is_finished() {
            if Instant::now() >= deadline {
                return Ok(false);
            }
            thread::sleep(JOIN_POLL);
        }

        match handle.join() {
            Ok(result) => result.map(|()| true),
            Err(_) => Err(PoolError::Panicked { id: self.id }),
        }
    }
}

/// Main worker loop
///
/// Phase order per iteration: Claiming -> Processing -> Reporting. The
/// gate is signaled exactly once per claimed item, on success and on
/// failure alike, so the driver's wait cannot stall on a bad file.
fn worker_loop(
    id: usize,
    ctx: WorkerContext,
    stats: Arc<WorkerStats>,
) -> Result<(), PoolError> {
    debug!(worker = id, phase = ?WorkerPhase::Idle, "Worker starting");

    loop {
        if ctx.shutdown.load(Ordering::Relaxed) {
            info!(worker = id, "Shutdown requested, worker exiting");
            break;
        }

        trace!(worker = id, phase = ?WorkerPhase::Claiming, "Claiming next item");
        let item = match ctx.claimer.try_claim() {
            Some(item) => item,
            None => {
                trace!(worker = id, phase = ?WorkerPhase::Terminated, "Queue drained");
                break;
            }
        };

        // Processing runs outside both locks; slow I/O here must not
        // serialize the other workers.
        trace!(worker = id, phase = ?WorkerPhase::Processing, item = item.index, path = %item.path.display(), "Processing item");
        let outcome = match (ctx.processor)(&item) {
            Ok(contribution) => {
                ctx.accumulator.add(contribution);
                stats.record_done();
                ItemOutcome::Done {
                    path: item.path.clone(),
                    contribution,
                }
            }
            Err(error) => {
                warn!(worker = id, item = item.index, error = %error, "Item failed");
                ctx.failures.record(error.clone());
                stats.record_failed();
                ItemOutcome::Failed { error }
            }
        };

        trace!(worker = id, phase = ?WorkerPhase::Reporting, done = outcome.is_done(), "Signaling gate");
        // Unconditional signal: failed items count toward completion too.
        ctx.gate.signal_one()?;
    }

    debug!(
        worker = id,
        done = stats.items_done.load(Ordering::Relaxed),
        failed = stats.items_failed.load(Ordering::Relaxed),
        "Worker terminated"
    );

    Ok(())
}
