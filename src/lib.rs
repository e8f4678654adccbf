//! file-tally - Parallel File Tally Engine
//!
//! A concurrent work-distribution and aggregation engine: a fixed pool
//! of worker threads drains a shared queue of data files, sums each
//! file, folds the partial sums into a shared grand total, and signals a
//! counting completion gate the driver waits on. A companion locking
//! module provides the ordered multi-lock discipline for code paths that
//! must hold more than one exclusive lock at a time.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Driver                             │
//! │   populate queue -> spawn pool -> await gate -> report    │
//! └───────────────────────────┬──────────────────────────────┘
//!                             │
//!                             ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Worker Threads                        │
//! │  ┌─────────┐  ┌─────────┐           ┌─────────┐          │
//! │  │Worker 0 │  │Worker 1 │   ...     │Worker N │          │
//! │  └────┬────┘  └────┬────┘           └────┬────┘          │
//! │       │ claim      │ claim               │ claim         │
//! │       ▼            ▼                     ▼               │
//! │            ┌──────────────────────────┐                  │
//! │            │       Work Queue         │  exactly-once    │
//! │            │  (crossbeam channel)     │  delivery        │
//! │            └──────────────────────────┘                  │
//! │       │ sum file   │                     │               │
//! │       ▼            ▼                     ▼               │
//! │            ┌──────────────────────────┐                  │
//! │            │    Shared Accumulator    │  mutex-guarded   │
//! │            └──────────────────────────┘                  │
//! │       │ signal     │                     │               │
//! │       ▼            ▼                     ▼               │
//! │            ┌──────────────────────────┐                  │
//! │            │     Completion Gate      │  counting        │
//! │            │   (mutex + condvar)      │  barrier         │
//! │            └──────────────────────────┘                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The queue lock and the accumulator lock are never held together; the
//! `locking` module's ranked acquisition covers the cases that do need
//! two locks at once.
//!
//! # Example
//!
//! ```no_run
//! use file_tally::config::TallyConfig;
//! use file_tally::datafile::file_processor;
//! use file_tally::engine::{TallyCoordinator, WorkItem};
//! use std::time::Duration;
//!
//! let config = TallyConfig {
//!     worker_count: 2,
//!     expected_completions: None,
//!     shutdown_timeout: Duration::from_secs(60),
//!     show_progress: false,
//!     verbose: false,
//! };
//!
//! let items = vec![
//!     WorkItem::new(0, "file1.txt"),
//!     WorkItem::new(1, "file2.txt"),
//! ];
//!
//! let result = TallyCoordinator::new(config, items, file_processor())
//!     .run()
//!     .expect("run failed");
//! println!("grand total: {}", result.total);
//! ```

pub mod config;
pub mod datafile;
pub mod engine;
pub mod error;
pub mod locking;
pub mod progress;

pub use config::{CliArgs, TallyConfig};
pub use engine::{TallyCoordinator, TallyResult};
pub use error::{Result, TallyError};
