//! Entry signals aligned to the snapshot time index.
//!
//! Signals are supplied, never computed here. A `true` at a given
//! timestamp means "open a position on this side using this
//! snapshot's price".

use crate::error::BacktestError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One side's entry signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntrySignal {
    /// Signal values keyed by snapshot timestamp. Timestamps missing
    /// from the map are treated as `false`.
    Aligned(HashMap<DateTime<Utc>, bool>),
    /// A raw boolean array of exactly the snapshot row count, in row
    /// order. Any length mismatch is a fatal input error.
    Raw(Vec<bool>),
}

impl EntrySignal {
    /// Builds an aligned signal from (timestamp, fired) pairs.
    #[must_use]
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (DateTime<Utc>, bool)>,
    {
        Self::Aligned(pairs.into_iter().collect())
    }

    /// Resolves the signal against the snapshot time index, yielding
    /// one boolean per snapshot row.
    ///
    /// # Errors
    /// Returns `BacktestError::SignalLengthMismatch` for a raw array
    /// whose length differs from the index length.
    pub fn resolve(&self, index: &[DateTime<Utc>]) -> Result<Vec<bool>, BacktestError> {
        match self {
            Self::Aligned(map) => Ok(index
                .iter()
                .map(|ts| map.get(ts).copied().unwrap_or(false))
                .collect()),
            Self::Raw(values) => {
                if values.len() != index.len() {
                    return Err(BacktestError::SignalLengthMismatch {
                        expected: index.len(),
                        actual: values.len(),
                    });
                }
                Ok(values.clone())
            }
        }
    }
}
