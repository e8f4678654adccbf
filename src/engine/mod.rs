//! The work-distribution and aggregation engine
//!
//! Bottom-up: a mutex-guarded accumulator, a channel-backed work queue
//! with exactly-once claiming, a counting completion gate, a fixed pool
//! of worker threads, and a coordinator tying them together.

pub mod accumulator;
pub mod coordinator;
pub mod gate;
pub mod queue;
pub mod worker;

pub use accumulator::SharedAccumulator;
pub use coordinator::{TallyCoordinator, TallyMonitor, TallyProgress, TallyResult};
pub use gate::CompletionGate;
pub use queue::{QueueStats, WorkItem, WorkQueue};
pub use worker::{FailureLog, ItemProcessor, Worker, WorkerPhase, WorkerStats};
