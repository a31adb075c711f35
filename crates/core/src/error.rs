//! Typed errors for caller contract violations.
//!
//! Only conditions that indicate a broken caller contract are fatal;
//! everything else (duplicate timestamps, unresolved windows, prices
//! outside bounds, empty signal sets) is recovered locally.

use thiserror::Error;

/// Fatal input or configuration errors.
#[derive(Debug, Error)]
pub enum BacktestError {
    /// The snapshot table does not carry every required column.
    #[error("snapshot table is missing required columns: {0:?}")]
    MissingColumns(Vec<String>),

    /// A raw signal array's length does not match the snapshot row count.
    #[error("signal array has {actual} entries but the snapshot table has {expected} rows")]
    SignalLengthMismatch {
        /// Snapshot row count.
        expected: usize,
        /// Signal array length.
        actual: usize,
    },

    /// A configuration parameter is out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
