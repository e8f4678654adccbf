//! Shared grand total mutated under mutual exclusion
//!
//! The accumulator is the leaf primitive of the engine: a single signed
//! total that every worker folds its partial sum into. The mutex makes
//! the locking contract visible at the type level - there is no way to
//! touch the total without holding the lock.
//!
//! The final value is only meaningful after the completion gate has
//! released the driver; intermediate reads are best-effort (the progress
//! reporter uses them for display only).

use std::sync::Mutex;

/// Mutex-guarded running total
#[derive(Debug, Default)]
pub struct SharedAccumulator {
    total: Mutex<i64>,
}

impl SharedAccumulator {
    /// Create an accumulator starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one contribution into the total
    ///
    /// Saturates on overflow; the per-file sum already guards overflow,
    /// so saturation here only matters for adversarial totals.
    pub fn add(&self, delta: i64) {
        let mut total = self.lock();
        *total = total.saturating_add(delta);
    }

    /// Read the current total
    pub fn value(&self) -> i64 {
        *self.lock()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, i64> {
        // A poisoned lock means a worker panicked mid-add. The i64 inside
        // is still a valid (if partial) total, so recover the guard.
        match self.total.lock() {
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
    fn test_starts_at_zero() {
        let acc = SharedAccumulator::new();
        assert_eq!(acc.value(), 0);
    }

    #[test]
    fn test_add_accumulates() {
        let acc = SharedAccumulator::new();
        acc.add(15);
        acc.add(-5);
        acc.add(40);
        assert_eq!(acc.value(), 50);
    }

    #[test]
    fn test_no_lost_updates_under_contention() {
        let acc = Arc::new(SharedAccumulator::new());
        let threads = 8;
        let adds_per_thread = 10_000;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let acc = Arc::clone(&acc);
                thread::spawn(move || {
                    for _ in 0..adds_per_thread {
                        acc.add(1);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(acc.value(), threads * adds_per_thread);
    }

    #[test]
    fn test_saturates_instead_of_wrapping() {
        let acc = SharedAccumulator::new();
        acc.add(i64::MAX);
        acc.add(1);
        assert_eq!(acc.value(), i64::MAX);
    }
}
