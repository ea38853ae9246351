//! Error types for the table and the word counter built on top of it.

use thiserror::Error;

/// Failures reported by [`ProbedTable`](crate::ProbedTable).
///
/// A missing key is never an error: `get` returns `None` and `remove` is a
/// no-op.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum TableError {
    /// A table must have at least one slot.
    #[error("table capacity must be at least one slot")]
    ZeroCapacity,
    /// Every slot on the key's probe sequence is occupied by another key.
    #[error("table is full: all {capacity} slots are occupied")]
    CapacityExhausted { capacity: usize },
    /// Requested more slots than the entry arena can address.
    #[error("table capacity {requested} exceeds the maximum of {max} slots")]
    CapacityTooLarge { requested: usize, max: usize },
    /// The slot array could not be allocated.
    #[error("failed to allocate {capacity} table slots")]
    AllocationFailed { capacity: usize },
}

/// Failures reported while counting words from a byte stream.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    /// An earlier table error stopped the counter mid-chunk; the rest of
    /// that chunk was not counted, so no further input is accepted.
    #[error("counter halted after an earlier error")]
    Halted,
}
