//! Trade records.
//!
//! A `Trade` is produced once by the trade builder, enriched once by
//! the position sizer into a `PricedTrade`, and immutable thereafter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use updown_core::Side;

/// A candidate trade before sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Snapshot time index the trade was taken from.
    pub timestamp: DateTime<Utc>,
    /// Which outcome the trade is betting on.
    pub side: Side,
    /// Ask price adjusted for slippage, within the configured bounds.
    pub entry_price: f64,
    /// 1.0 if this side's outcome occurred, 0.0 otherwise.
    pub settlement: f64,
    /// Window open.
    pub start_time: DateTime<Utc>,
    /// Window close / settlement key.
    pub end_time: DateTime<Utc>,
    /// Pass-through columns forwarded verbatim from the snapshot.
    #[serde(default)]
    pub meta: HashMap<String, String>,
}

impl Trade {
    /// Returns true if the trade's side won the window.
    #[must_use]
    pub fn is_win(&self) -> bool {
        self.settlement == 1.0
    }
}

/// A trade enriched with sizing, fee, and PnL fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedTrade {
    /// The pre-sizing trade record.
    pub trade: Trade,
    /// Dollar stake for this trade.
    pub bet_size: f64,
    /// Fee in shares deducted from the gross quantity.
    pub fee: f64,
    /// Net share quantity after fees.
    pub qty: f64,
    /// Realized profit and loss.
    pub pnl: f64,
    /// Account balance the stake was sized from (percentage policy
    /// only; the pre-update balance of the trade's window).
    pub balance: Option<f64>,
}
