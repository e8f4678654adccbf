//! file-tally - Parallel File Tally Engine
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use file_tally::config::{collect_items, CliArgs, Command, TallyConfig};
use file_tally::datafile::{file_processor, generate_sample_files};
use file_tally::engine::TallyCoordinator;
use file_tally::locking::{ExchangePair, OrderPolicy};
use file_tally::progress::{
    print_exchange_outcome, print_header, print_summary, ProgressReporter,
};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    match &args.command {
        Some(Command::Generate { dir, count }) => {
            let paths = generate_sample_files(dir, *count)
                .with_context(|| format!("Failed to write sample files into '{}'", dir.display()))?;
            info!(count = paths.len(), dir = %dir.display(), "Sample files written");
            println!("Wrote {} sample files to {}", paths.len(), dir.display());
            Ok(())
        }
        Some(Command::Deadlock {
            unordered,
            hold_ms,
            timeout_ms,
        }) => run_exchange(*unordered, *hold_ms, *timeout_ms),
        None => run_tally(&args),
    }
}

/// Run the standard tally over the file arguments
fn run_tally(args: &CliArgs) -> Result<()> {
    let config = TallyConfig::from_args(args).context("Invalid configuration")?;
    let items = collect_items(&args.files).context("Invalid input files")?;
    config
        .check_expected(items.len())
        .context("Inconsistent completion count")?;

    if config.show_progress {
        print_header(items.len(), config.worker_count);
    }

    let coordinator = TallyCoordinator::new(config.clone(), items, file_processor());

    // Graceful shutdown on Ctrl-C: workers notice the flag between items
    let shutdown_flag = coordinator.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    // Progress display runs off the monitor handle in its own thread
    let reporter_stop = Arc::new(AtomicBool::new(false));
    let reporter_thread = if config.show_progress {
        let monitor = coordinator.monitor();
        let stop = Arc::clone(&reporter_stop);
        Some(std::thread::spawn(move || {
            let reporter = ProgressReporter::new();
            while !stop.load(Ordering::Relaxed) && !monitor.is_complete() {
                reporter.update(&monitor.progress());
                std::thread::sleep(Duration::from_millis(200));
            }
            reporter.finish_and_clear();
        }))
    } else {
        None
    };

    let result = coordinator.run();

    reporter_stop.store(true, Ordering::SeqCst);
    if let Some(handle) = reporter_thread {
        let _ = handle.join();
    }

    let result = result.context("Tally run failed")?;
    print_summary(&result);

    if result.completed {
        Ok(())
    } else {
        anyhow::bail!("Run was interrupted before all items completed")
    }
}

/// Run the two-lock exchange demonstration
fn run_exchange(unordered: bool, hold_ms: u64, timeout_ms: u64) -> Result<()> {
    let policy = if unordered {
        OrderPolicy::AsGiven
    } else {
        OrderPolicy::Ranked
    };

    info!(?policy, hold_ms, timeout_ms, "Running exchange demonstration");

    let pair = ExchangePair::new(100, 100);
    let outcome = pair
        .run_transfers(
            policy,
            10,
            Duration::from_millis(hold_ms),
            Duration::from_millis(timeout_ms),
        )
        .context("Failed to start exchange threads")?;

    print_exchange_outcome(outcome.completed, outcome.left, outcome.right);

    if outcome.completed {
        Ok(())
    } else {
        anyhow::bail!("Transfers deadlocked (circular wait) and were abandoned after timeout")
    }
}

/// Initialize tracing with an env-filter, defaulting by verbosity
fn setup_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("file_tally={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(())
}
