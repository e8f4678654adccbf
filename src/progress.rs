//! Progress reporting for the tally run
//!
//! Provides real-time progress display using an indicatif spinner fed
//! from the coordinator's monitor handle, plus the styled header and
//! summary the CLI prints around a run.

use crate::engine::coordinator::{TallyProgress, TallyResult};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter that displays run status
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &TallyProgress) {
        let done = progress.total_items.saturating_sub(progress.outstanding);
        let msg = format!(
            "Items: {}/{} | Claimed: {} | Running total: {}",
            done, progress.total_items, progress.claimed, progress.running_total,
        );
        self.bar.set_message(msg);
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Print a header at the start of the run
pub fn print_header(items: usize, workers: usize) {
    println!();
    println!(
        "{} {}",
        style("file-tally").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Items:").bold(), items);
    println!("  {} {}", style("Workers:").bold(), workers);
    println!();
}

/// Print a summary of the run results
pub fn print_summary(result: &TallyResult) {
    let secs = result.duration.as_secs_f64();

    println!();
    if result.completed {
        println!("{}", style("Tally Complete").green().bold());
    } else {
        println!("{}", style("Tally Interrupted").yellow().bold());
    }
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Grand total:").bold(), result.total);
    println!(
        "  {} {}/{}",
        style("Items:").bold(),
        result.items_done,
        result.items_enqueued
    );
    println!("  {} {:.2}s", style("Duration:").bold(), secs);

    if result.items_failed > 0 {
        println!(
            "  {} {}",
            style("Failed:").yellow().bold(),
            result.items_failed
        );
        for failure in &result.failures {
            println!("    {} {}", style("✗").red(), failure);
        }
    }
    println!();
}

/// Print the outcome of a deadlock demonstration run
pub fn print_exchange_outcome(completed: bool, left: i64, right: i64) {
    println!();
    if completed {
        println!("{}", style("Exchange Complete").green().bold());
        println!("{}", style("─".repeat(50)).dim());
        println!("  {} {}", style("Left register:").bold(), left);
        println!("  {} {}", style("Right register:").bold(), right);
    } else {
        println!("{}", style("Deadlock Detected").red().bold());
        println!("{}", style("─".repeat(50)).dim());
        println!("  Both transfers held their first lock and blocked on the second.");
        println!("  Re-run without --unordered to see rank-ordered acquisition succeed.");
    }
    println!();
}

