//! Multi-lock acquisition ordering
//!
//! The engine itself never holds two locks at once; this module covers
//! the code paths that must. A global rank on every lock plus one
//! acquisition function that honors it is all it takes to rule out
//! circular wait.

pub mod exchange;
pub mod ordered;

pub use exchange::{ExchangeOutcome, ExchangePair};
pub use ordered::{acquire_pair, OrderPolicy, RankedLock};
