//! Configuration types for file-tally
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - Work-item collection from the input file list

use crate::engine::queue::WorkItem;
use crate::error::ConfigError;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Parallel file tally engine
#[derive(Parser, Debug, Clone)]
#[command(
    name = "file-tally",
    version,
    about = "Sum integer data files in parallel with a fixed worker pool",
    long_about = "Distributes data files across a fixed pool of worker threads. Each worker \
                  claims one file at a time from a shared queue, sums its integers, folds the \
                  partial sum into a shared grand total, and signals a completion gate the \
                  driver waits on.",
    after_help = "EXAMPLES:\n    \
        file-tally data/*.txt\n    \
        file-tally -w 2 file1.txt file2.txt file3.txt\n    \
        file-tally generate data/ --count 5\n    \
        file-tally deadlock --unordered --hold-ms 200",
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
pub struct CliArgs {
    /// Data files to sum (whitespace-separated integers)
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Subcommand (generate, deadlock)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Number of worker threads
    #[arg(short = 'w', long, default_value_t = default_workers(), value_name = "NUM")]
    pub workers: usize,

    /// Expected completions for the gate (defaults to the item count)
    #[arg(long, value_name = "NUM")]
    pub expected: Option<usize>,

    /// Bound on the wait for pool drain before giving up, in seconds
    #[arg(long, default_value = "60", value_name = "SECS")]
    pub shutdown_timeout: u64,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Subcommands
#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Write sample data files (file i holds 5(i-1)+1 ..= 5(i-1)+5)
    Generate {
        /// Directory to write the files into
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Number of files to generate
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
    },

    /// Run the two-lock exchange, ordered or deliberately deadlock-prone
    Deadlock {
        /// Acquire the pair in caller order instead of rank order
        /// (reproduces the circular wait)
        #[arg(long)]
        unordered: bool,

        /// Delay between first and second acquisition, in milliseconds
        #[arg(long, default_value = "500", value_name = "MS")]
        hold_ms: u64,

        /// Bound on the wait for both transfers, in milliseconds
        #[arg(long, default_value = "5000", value_name = "MS")]
        timeout_ms: u64,
    },
}

fn default_workers() -> usize {
    // Item processing is I/O bound but short; one worker per core is plenty
    num_cpus::get()
}

/// Validated runtime configuration for a tally run
#[derive(Debug, Clone)]
pub struct TallyConfig {
    /// Number of worker threads
    pub worker_count: usize,

    /// Gate size override; `None` means one completion per queued item
    pub expected_completions: Option<usize>,

    /// Bound on the driver's wait for pool drain
    pub shutdown_timeout: Duration,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl TallyConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        if args.shutdown_timeout == 0 {
            return Err(ConfigError::InvalidTimeout {
                secs: args.shutdown_timeout,
            });
        }

        Ok(Self {
            worker_count: args.workers,
            expected_completions: args.expected,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }

    /// Check an explicit completion count against the queued item count
    ///
    /// The gate counts items, not workers; an override that disagrees
    /// with the queue would either stall the driver or trip the gate's
    /// miscount guard, so it is rejected up front.
    pub fn check_expected(&self, items: usize) -> Result<(), ConfigError> {
        match self.expected_completions {
            Some(expected) if expected != items => {
                Err(ConfigError::CompletionMismatch { expected, items })
            }
            _ => Ok(()),
        }
    }
}

/// Turn the input file list into work items, validating each path
pub fn collect_items(files: &[PathBuf]) -> Result<Vec<WorkItem>, ConfigError> {
    if files.is_empty() {
        return Err(ConfigError::NoInput);
    }

    let mut items = Vec::with_capacity(files.len());
    for (index, path) in files.iter().enumerate() {
        if !path.is_file() {
            return Err(ConfigError::MissingInput { path: path.clone() });
        }
        items.push(WorkItem::new(index, path.clone()));
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(workers: usize, timeout: u64) -> CliArgs {
        CliArgs {
            files: vec![PathBuf::from("a.txt")],
            command: None,
            workers,
            expected: None,
            shutdown_timeout: timeout,
            quiet: true,
            verbose: false,
        }
    }

    #[test]
    fn test_valid_config() {
        let config = TallyConfig::from_args(&args(4, 30)).unwrap();
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
        assert!(!config.show_progress);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = TallyConfig::from_args(&args(0, 30)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWorkerCount { count: 0, .. }));
    }

    #[test]
    fn test_excessive_workers_rejected() {
        let err = TallyConfig::from_args(&args(100_000, 30)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWorkerCount { .. }));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = TallyConfig::from_args(&args(4, 0)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout { secs: 0 }));
    }

    #[test]
    fn test_expected_must_match_items() {
        let mut config = TallyConfig::from_args(&args(4, 30)).unwrap();
        config.expected_completions = Some(3);

        assert!(config.check_expected(3).is_ok());
        let err = config.check_expected(5).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::CompletionMismatch { expected: 3, items: 5 }
        ));
    }

    #[test]
    fn test_default_expected_always_ok() {
        let config = TallyConfig::from_args(&args(4, 30)).unwrap();
        assert!(config.check_expected(0).is_ok());
        assert!(config.check_expected(99).is_ok());
    }

    #[test]
    fn test_collect_items_requires_input() {
        let err = collect_items(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::NoInput));
    }

    #[test]
    fn test_collect_items_rejects_missing_file() {
        let files = vec![PathBuf::from("/no/such/input.txt")];
        let err = collect_items(&files).unwrap_err();
        assert!(matches!(err, ConfigError::MissingInput { .. }));
    }
}
