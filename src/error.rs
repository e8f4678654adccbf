//! Error types for file-tally
//!
//! This module defines the error hierarchy covering:
//! - Per-item processing errors (file read/parse failures)
//! - Worker pool and completion-gate errors
//! - Configuration and CLI errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors should be actionable - include context about what to do
//! - A failed item is not a failed run: item errors are collected, not
//!   propagated, so one bad file never stalls the pool or the gate

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level error type for the file-tally application
#[derive(Error, Debug)]
pub enum TallyError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker pool / gate errors
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    /// Item processing errors (when surfaced directly, e.g. by the CLI
    /// generate command writing sample files)
    #[error("Item error: {0}")]
    Item(#[from] ItemError),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Interrupted by signal
    #[error("Operation interrupted by signal")]
    Interrupted,
}

/// Errors while processing a single work item
///
/// These are caught locally by the worker that claimed the item. The
/// worker still signals the completion gate, so the driver's wait can
/// never hang on a bad file.
#[derive(Error, Debug, Clone)]
pub enum ItemError {
    /// File could not be opened or read
    #[error("Failed to read '{path}': {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    /// File contained a token that is not an integer
    #[error("Failed to parse '{path}': '{token}' is not an integer")]
    ParseFailed { path: PathBuf, token: String },

    /// Summing the file overflowed i64
    #[error("Sum overflow while processing '{path}'")]
    Overflow { path: PathBuf },
}

impl ItemError {
    /// The path of the item this error belongs to
    pub fn path(&self) -> &PathBuf {
        match self {
            ItemError::ReadFailed { path, .. } => path,
            ItemError::ParseFailed { path, .. } => path,
            ItemError::Overflow { path } => path,
        }
    }
}

/// Worker pool and completion-gate errors
#[derive(Error, Debug)]
pub enum PoolError {
    /// Worker thread could not be spawned
    #[error("Failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },

    /// Worker panicked
    #[error("Worker {id} panicked")]
    Panicked { id: usize },

    /// The gate received more signals than its expected count
    ///
    /// This is a logic defect (expected_completions undersized), not a
    /// runtime condition to recover from.
    #[error("Completion gate over-signaled: expected {expected} completions")]
    GateMiscount { expected: usize },

    /// The bounded wait on pool shutdown expired
    ///
    /// Either a true deadlock (violated lock ordering) or a worker stuck
    /// in external I/O well past the configured deadline.
    #[error("Pool did not drain within {timeout:?} ({outstanding} completions outstanding)")]
    ShutdownTimeout {
        timeout: Duration,
        outstanding: usize,
    },
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid shutdown timeout
    #[error("Invalid shutdown timeout {secs}s: must be at least 1 second")]
    InvalidTimeout { secs: u64 },

    /// Expected completions inconsistent with the queued item count
    #[error("Expected completions {expected} does not match {items} queued items")]
    CompletionMismatch { expected: usize, items: usize },

    /// No input files given
    #[error("No input files to process")]
    NoInput,

    /// Input file missing
    #[error("Input file not found: '{path}'")]
    MissingInput { path: PathBuf },
}

/// Result type alias for TallyError
pub type Result<T> = std::result::Result<T, TallyError>;

/// Result type alias for ItemError
pub type ItemResult<T> = std::result::Result<T, ItemError>;

/// The outcome of processing a single work item
#[derive(Debug)]
pub enum ItemOutcome {
    /// Item processed, contribution folded into the accumulator
    Done { path: PathBuf, contribution: i64 },

    /// Item failed; recorded but not fatal
    Failed { error: ItemError },
}

impl ItemOutcome {
    /// Returns true if this outcome represents success
    pub fn is_done(&self) -> bool {
        matches!(self, ItemOutcome::Done { .. })
    }

    /// The path associated with this outcome
    pub fn path(&self) -> &PathBuf {
        match self {
            ItemOutcome::Done { path, .. } => path,
            ItemOutcome::Failed { error } => error.path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_error_path() {
        let err = ItemError::ParseFailed {
            path: "data/file1.txt".into(),
            token: "abc".into(),
        };
        assert_eq!(err.path(), &PathBuf::from("data/file1.txt"));
    }

    #[test]
    fn test_error_conversion() {
        let pool_err = PoolError::GateMiscount { expected: 5 };
        let tally_err: TallyError = pool_err.into();
        assert!(matches!(tally_err, TallyError::Pool(_)));
    }

    #[test]
    fn test_outcome_accessors() {
        let done = ItemOutcome::Done {
            path: "a.txt".into(),
            contribution: 15,
        };
        assert!(done.is_done());
        assert_eq!(done.path(), &PathBuf::from("a.txt"));

        let failed = ItemOutcome::Failed {
            error: ItemError::Overflow { path: "b.txt".into() },
        };
        assert!(!failed.is_done());
        assert_eq!(failed.path(), &PathBuf::from("b.txt"));
    }
}
