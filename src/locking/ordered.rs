//! Ranked locks and ordered pair acquisition
//!
//! Any code path that must hold two exclusive locks at once is exposed
//! to circular wait: two threads each holding one lock of the pair while
//! blocking on the other. `RankedLock` assigns every lock a place in a
//! single global order, and `acquire_pair` can enforce that order
//! regardless of the order callers name the locks in.
//!
//! Both acquisition policies run through the same code path. `AsGiven`
//! reproduces the circular-wait hazard (two callers passing the pair in
//! opposite order will deadlock whenever both get their first lock
//! before either gets its second); `Ranked` sorts by rank first, which
//! removes the hazard independent of timing or thread count. The test
//! suite exercises both under a bounded timeout.

use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

/// A mutex with a fixed position in the global acquisition order
#[derive(Debug)]
pub struct RankedLock<T> {
    rank: u32,
    label: &'static str,
    inner: Mutex<T>,
}

impl<T> RankedLock<T> {
    /// Create a lock at the given rank
    ///
    /// Ranks must be unique within any set of locks that can be held
    /// together; ties would make the order ambiguous.
    pub fn new(rank: u32, label: &'static str, value: T) -> Self {
        Self {
            rank,
            label,
            inner: Mutex::new(value),
        }
    }

    /// This lock's rank
    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// Human-readable label for logging
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Acquire this lock alone
    pub fn lock(&self) -> MutexGuard<'_, T> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// How `acquire_pair` orders its two acquisitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderPolicy {
    /// Acquire in the order the caller passed the locks
    ///
    /// Deadlock-prone: callers naming the same pair in opposite order
    /// form a circular wait.
    AsGiven,

    /// Always acquire the lower rank first, whatever order the caller
    /// passed the locks in
    Ranked,
}

/// Acquire two ranked locks, holding `hold` between the acquisitions
///
/// The hold delay widens the window between first and second lock; with
/// `AsGiven` and two threads passing opposite orders it makes the
/// deadlock reproduce essentially every run. Guards are returned in
/// argument order regardless of acquisition order.
pub fn acquire_pair<'a, T>(
    first: &'a RankedLock<T>,
    second: &'a RankedLock<T>,
    policy: OrderPolicy,
    hold: Duration,
) -> (MutexGuard<'a, T>, MutexGuard<'a, T>) {
    debug_assert_ne!(first.rank, second.rank, "ranks in a pair must differ");

    let swap = match policy {
        OrderPolicy::AsGiven => false,
        OrderPolicy::Ranked => first.rank > second.rank,
    };

    let (a, b) = if swap { (second, first) } else { (first, second) };

    tracing::trace!(lock = a.label, rank = a.rank, "Acquiring first lock");
    let guard_a = a.lock();
    if !hold.is_zero() {
        thread::sleep(hold);
    }
    tracing::trace!(lock = b.label, rank = b.rank, "Acquiring second lock");
    let guard_b = b.lock();

    if swap {
        (guard_b, guard_a)
    } else {
        (guard_a, guard_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_alone() {
        let lock = RankedLock::new(1, "counter", 41i64);
        *lock.lock() += 1;
        assert_eq!(*lock.lock(), 42);
        assert_eq!(lock.rank(), 1);
        assert_eq!(lock.label(), "counter");
    }

    #[test]
    fn test_pair_guards_match_argument_order() {
        let low = RankedLock::new(1, "low", 10i64);
        let high = RankedLock::new(2, "high", 20i64);

        // Passed high-first under Ranked: acquisition reorders, but the
        // returned guards still map to the arguments.
        let (g_high, g_low) =
            acquire_pair(&high, &low, OrderPolicy::Ranked, Duration::ZERO);
        assert_eq!(*g_high, 20);
        assert_eq!(*g_low, 10);
    }

    #[test]
    fn test_as_given_respects_argument_order() {
        let low = RankedLock::new(1, "low", 1i64);
        let high = RankedLock::new(2, "high", 2i64);

        let (g1, g2) = acquire_pair(&low, &high, OrderPolicy::AsGiven, Duration::ZERO);
        assert_eq!(*g1, 1);
        assert_eq!(*g2, 2);
    }
}
