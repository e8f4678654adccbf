//! Paired-exchange harness for the lock ordering discipline
//!
//! Two tally registers, two threads, each moving units between the
//! registers while naming the pair in opposite order. Under
//! `OrderPolicy::AsGiven` this is the textbook circular wait; under
//! `OrderPolicy::Ranked` the same two transfers complete immediately.
//! The harness bounds the run with the completion gate's timed wait so a
//! reproduction never hangs the caller.

use crate::engine::gate::CompletionGate;
use crate::error::PoolError;
use crate::locking::ordered::{acquire_pair, OrderPolicy, RankedLock};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Outcome of one harness run
#[derive(Debug)]
pub struct ExchangeOutcome {
    /// Whether both transfers finished before the timeout
    pub completed: bool,

    /// Final value of the left register (meaningful only on completion)
    pub left: i64,

    /// Final value of the right register (meaningful only on completion)
    pub right: i64,
}

/// A pair of ranked registers transfers run against
pub struct ExchangePair {
    left: Arc<RankedLock<i64>>,
    right: Arc<RankedLock<i64>>,
}

impl ExchangePair {
    /// Create a register pair with the given starting balances
    pub fn new(left: i64, right: i64) -> Self {
        Self {
            left: Arc::new(RankedLock::new(1, "left-register", left)),
            right: Arc::new(RankedLock::new(2, "right-register", right)),
        }
    }

    /// Move `amount` units from one register to the other
    ///
    /// Needs both locks held together so the combined balance is never
    /// observable mid-transfer. `hold` widens the gap between the two
    /// acquisitions.
    pub fn transfer(
        from: &RankedLock<i64>,
        to: &RankedLock<i64>,
        amount: i64,
        policy: OrderPolicy,
        hold: Duration,
    ) {
        let (mut src, mut dst) = acquire_pair(from, to, policy, hold);
        *src -= amount;
        *dst += amount;
    }

    /// Run two opposite-order transfers concurrently, bounded by `timeout`
    ///
    /// Thread A transfers left-to-right, thread B right-to-left; each
    /// names the pair in its own direction, so `AsGiven` acquires the
    /// locks in opposite orders across the threads. On timeout the
    /// deadlocked threads are abandoned (they hold no resources other
    /// than the pair itself).
    pub fn run_transfers(
        &self,
        policy: OrderPolicy,
        amount: i64,
        hold: Duration,
        timeout: Duration,
    ) -> Result<ExchangeOutcome, PoolError> {
        info!(?policy, ?hold, ?timeout, "Starting paired exchange");
        let gate = Arc::new(CompletionGate::new(2));

        let directions = [
            ("exchange-a", Arc::clone(&self.left), Arc::clone(&self.right)),
            ("exchange-b", Arc::clone(&self.right), Arc::clone(&self.left)),
        ];
        for (id, (name, from, to)) in directions.into_iter().enumerate() {
            let gate = Arc::clone(&gate);
            thread::Builder::new()
                .name(name.into())
                .spawn(move || {
                    Self::transfer(&from, &to, amount, policy, hold);
                    debug!(thread = name, "Transfer complete");
                    // Over-signal is impossible: exactly two transfer
                    // threads exist per gate.
                    let _ = gate.signal_one();
                })
                .map_err(|e| PoolError::SpawnFailed {
                    id,
                    reason: e.to_string(),
                })?;
        }

        let completed = gate.await_all_timeout(timeout);
        if completed {
            Ok(ExchangeOutcome {
                completed: true,
                left: *self.left.lock(),
                right: *self.right.lock(),
            })
        } else {
            info!("Exchange did not complete within timeout (circular wait)");
            Ok(ExchangeOutcome {
                completed: false,
                left: 0,
                right: 0,
            })
        }
    }
}
