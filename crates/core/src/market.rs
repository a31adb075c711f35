//! Market domain types for binary up/down settlement windows.
//!
//! A market window opens at `start_time`, settles at `end_time`, and
//! resolves to exactly one of two outcomes. Each order-book snapshot
//! carries the best ask for both outcome tokens at one point in time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Which of the two mutually exclusive outcomes a trade is betting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The "up" outcome token (pays 1.0 if the market resolves up).
    Up,
    /// The "down" outcome token (pays 1.0 if the market resolves down).
    Down,
}

impl Side {
    /// Returns the lowercase label used in output tables.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resolution state of a settlement window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// The "up" outcome occurred.
    Up,
    /// The "down" outcome occurred.
    Down,
    /// The market has not resolved (yet).
    Unknown,
}

impl Resolution {
    /// Parses a resolution label case-insensitively.
    ///
    /// Anything other than `UP` or `DOWN` normalizes to `Unknown`;
    /// an unresolved market is a valid input state, not an error.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "UP" => Self::Up,
            "DOWN" => Self::Down,
            _ => Self::Unknown,
        }
    }

    /// Canonical uppercase label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Returns true if the window has a known outcome.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Settlement value of one share on the given side, if resolved.
    ///
    /// A winning share pays 1.0 and a losing share pays 0.0. The
    /// "down" payout is the complement of the "up" outcome indicator.
    #[must_use]
    pub fn settlement_for(&self, side: Side) -> Option<f64> {
        let up_outcome = match self {
            Self::Up => 1.0,
            Self::Down => 0.0,
            Self::Unknown => return None,
        };
        Some(match side {
            Side::Up => up_outcome,
            Side::Down => 1.0 - up_outcome,
        })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One order-book snapshot of a single up/down market.
///
/// Snapshots are keyed by `timestamp`; `start_time` and `end_time`
/// identify the settlement window the snapshot belongs to (several
/// snapshots may share one window). Prices are in (0, 1), the implied
/// probability of each outcome. Missing asks are `None` and any trade
/// candidate built from them is dropped downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// Snapshot time index (row key).
    pub timestamp: DateTime<Utc>,
    /// Window open.
    pub start_time: DateTime<Utc>,
    /// Window close / settlement key.
    pub end_time: DateTime<Utc>,
    /// Resolution state of the window.
    pub resolved: Resolution,
    /// Best ask for the "up" token.
    pub up_best_ask: Option<f64>,
    /// Best ask for the "down" token.
    pub down_best_ask: Option<f64>,
    /// Pass-through metadata columns, forwarded verbatim onto trades.
    #[serde(default)]
    pub meta: HashMap<String, String>,
}

impl BookSnapshot {
    /// Creates a snapshot with no metadata.
    #[must_use]
    pub fn new(
        timestamp: DateTime<Utc>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        resolved: Resolution,
        up_best_ask: Option<f64>,
        down_best_ask: Option<f64>,
    ) -> Self {
        Self {
            timestamp,
            start_time,
            end_time,
            resolved,
            up_best_ask,
            down_best_ask,
            meta: HashMap::new(),
        }
    }

    /// Best ask for the given side.
    #[must_use]
    pub fn best_ask(&self, side: Side) -> Option<f64> {
        match side {
            Side::Up => self.up_best_ask,
            Side::Down => self.down_best_ask,
        }
    }
}

/// Drops duplicate time-index entries, keeping the first occurrence.
///
/// Duplicate keys are illegal input; this is a defensive
/// normalization applied before any processing. Input order is
/// otherwise preserved.
#[must_use]
pub fn dedup_snapshots(snapshots: Vec<BookSnapshot>) -> Vec<BookSnapshot> {
    let mut seen: HashSet<DateTime<Utc>> = HashSet::with_capacity(snapshots.len());
    let before = snapshots.len();
    let out: Vec<BookSnapshot> = snapshots
        .into_iter()
        .filter(|s| seen.insert(s.timestamp))
        .collect();
    if out.len() < before {
        tracing::debug!(
            dropped = before - out.len(),
            "dropped duplicate snapshot timestamps (first occurrence kept)"
        );
    }
    out
}
