//! Data-file reading and generation
//!
//! The external collaborator behind each work item: a data file holds
//! whitespace-separated signed integers, and processing an item means
//! summing them. Also provides the sample-file generator used by the
//! `generate` subcommand and the test suite.

use crate::engine::queue::WorkItem;
use crate::engine::worker::ItemProcessor;
use crate::error::{ItemError, ItemResult};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Integers written to each generated sample file
pub const SAMPLE_VALUES_PER_FILE: i64 = 5;

/// Sum all integers in one data file
///
/// Tokens are split on any whitespace, so both one-per-line and
/// space-separated layouts parse. An empty file sums to zero.
pub fn sum_file(path: &Path) -> ItemResult<i64> {
    let file = File::open(path).map_err(|e| ItemError::ReadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let reader = BufReader::new(file);
    let mut total: i64 = 0;

    for line in reader.lines() {
        let line = line.map_err(|e| ItemError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        for token in line.split_whitespace() {
            let value: i64 = token.parse().map_err(|_| ItemError::ParseFailed {
                path: path.to_path_buf(),
                token: token.to_string(),
            })?;
            total = total.checked_add(value).ok_or(ItemError::Overflow {
                path: path.to_path_buf(),
            })?;
        }
    }

    Ok(total)
}

/// The standard item processor: sum the file the item points at
pub fn file_processor() -> Arc<ItemProcessor> {
    Arc::new(|item: &WorkItem| sum_file(&item.path))
}

/// Write `count` sample data files into `dir`
///
/// File `i` (1-based) holds the five sequential integers
/// `5*(i-1)+1 ..= 5*(i-1)+5`, one per line, so `count = 5` produces the
/// values 1..=25 with a combined total of 325.
pub fn generate_sample_files(dir: &Path, count: usize) -> std::io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut paths = Vec::with_capacity(count);
    for i in 1..=count as i64 {
        let path = dir.join(format!("file{i}.txt"));
        let mut file = File::create(&path)?;
        for j in 1..=SAMPLE_VALUES_PER_FILE {
            let number = (i - 1) * SAMPLE_VALUES_PER_FILE + j;
            writeln!(file, "{number}")?;
        }
        paths.push(path);
    }

    Ok(paths)
}
