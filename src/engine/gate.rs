//! Counting completion gate
//!
//! A counting barrier: constructed with the number of expected
//! completions, decremented once per processed item, releasing any
//! waiters when the count reaches zero. The Rust rendition of a
//! count-down latch, built on a mutex plus condvar so waiters actually
//! sleep instead of spinning.
//!
//! Workers signal once per claimed item whether processing succeeded or
//! failed; that is what makes the driver's wait safe against bad files.

use crate::error::PoolError;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// Counting barrier releasing waiters after N signals
#[derive(Debug)]
pub struct CompletionGate {
    expected: usize,
    remaining: Mutex<usize>,
    zero: Condvar,
}

impl CompletionGate {
    /// Create a gate expecting `expected` signals
    ///
    /// `expected` of zero is valid: the gate is already open and
    /// `await_all` returns immediately.
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            remaining: Mutex::new(expected),
            zero: Condvar::new(),
        }
    }

    /// The count the gate was constructed with
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Signals still outstanding
    pub fn outstanding(&self) -> usize {
        *self.lock()
    }

    /// Report one completion
    ///
    /// Errors with `GateMiscount` if the gate has already received all
    /// expected signals - the count never goes negative.
    pub fn signal_one(&self) -> Result<(), PoolError> {
        let mut remaining = self.lock();
        if *remaining == 0 {
            return Err(PoolError::GateMiscount {
                expected: self.expected,
            });
        }
        *remaining -= 1;
        if *remaining == 0 {
            self.zero.notify_all();
        }
        Ok(())
    }

    /// Block until all expected signals have arrived
    pub fn await_all(&self) {
        let mut remaining = self.lock();
        while *remaining > 0 {
            remaining = match self.zero.wait(remaining) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    /// Block until all signals arrive or the timeout expires
    ///
    /// Returns true if the gate opened, false on timeout. This backs the
    /// driver's bounded shutdown wait and the deadlock-detection harness.
    pub fn await_all_timeout(&self, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        let mut remaining = self.lock();
        while *remaining > 0 {
            let now = std::time::Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = match self.zero.wait_timeout(remaining, deadline - now) {
                Ok(res) => res,
                Err(poisoned) => poisoned.into_inner(),
            };
            remaining = guard;
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        match self.remaining.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_zero_expected_opens_immediately() {
        let gate = CompletionGate::new(0);
        gate.await_all();
        assert!(gate.await_all_timeout(Duration::from_millis(1)));
    }

    #[test]
    fn test_waiter_released_after_n_signals() {
        let gate = Arc::new(CompletionGate::new(3));
        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.await_all())
        };

        for _ in 0..3 {
            gate.signal_one().unwrap();
        }
        waiter.join().unwrap();
        assert_eq!(gate.outstanding(), 0);
    }

    #[test]
    fn test_timeout_when_undersignaled() {
        let gate = CompletionGate::new(2);
        gate.signal_one().unwrap();
        assert!(!gate.await_all_timeout(Duration::from_millis(50)));
        assert_eq!(gate.outstanding(), 1);
    }

    #[test]
    fn test_over_signal_is_miscount() {
        let gate = CompletionGate::new(1);
        gate.signal_one().unwrap();

        let err = gate.signal_one().unwrap_err();
        assert!(matches!(err, PoolError::GateMiscount { expected: 1 }));
        // Count stayed at zero
        assert_eq!(gate.outstanding(), 0);
    }

    #[test]
    fn test_signals_from_many_threads() {
        let n = 64;
        let gate = Arc::new(CompletionGate::new(n));

        let handles: Vec<_> = (0..n)
            .map(|_| {
                let gate = Arc::clone(&gate);
                thread::spawn(move || gate.signal_one().unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(gate.await_all_timeout(Duration::from_secs(1)));
    }
}
