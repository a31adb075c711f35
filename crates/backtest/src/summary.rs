//! Per-settlement-window performance summary.
//!
//! Aggregates the priced ledger into one row per distinct `end_time`,
//! then runs an ordered cumulative pass for equity statistics. The
//! cumulative columns are recomputed in full from the ledger every
//! time; there is no incremental mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use updown_core::{Resolution, Side};

use crate::trade::PricedTrade;

/// One settlement window's aggregate statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSummary {
    /// Window close / settlement key.
    pub end_time: DateTime<Utc>,
    /// Realized outcome of the window.
    pub resolved: Resolution,
    /// Trades in the window.
    pub total_trades: usize,
    /// Trades on the "up" side.
    pub up_trades: usize,
    /// Trades on the "down" side.
    pub dn_trades: usize,
    /// Mean entry price of up trades, if any.
    pub up_avg_entry: Option<f64>,
    /// Mean entry price of down trades, if any.
    pub dn_avg_entry: Option<f64>,
    /// Summed PnL of up trades.
    pub up_pnl: f64,
    /// Summed PnL of down trades.
    pub dn_pnl: f64,
    /// Total window PnL.
    pub total_pnl: f64,
    /// Running sum of `total_pnl` in `end_time` order.
    pub cum_pnl: f64,
    /// Running peak of `cum_pnl` minus current `cum_pnl` (>= 0).
    pub drawdown: f64,
    /// Whether the window was profitable.
    pub win: bool,
    /// Expanding mean of `win` over windows seen so far.
    pub win_rate: f64,
}

/// Aggregates a priced ledger into per-window summary rows, sorted
/// ascending by `end_time`. An empty ledger yields an empty summary.
#[must_use]
pub fn summarize(ledger: &[PricedTrade]) -> Vec<WindowSummary> {
    let mut windows: BTreeMap<DateTime<Utc>, Vec<&PricedTrade>> = BTreeMap::new();
    for priced in ledger {
        windows.entry(priced.trade.end_time).or_default().push(priced);
    }

    let mut rows: Vec<WindowSummary> = Vec::with_capacity(windows.len());
    let mut cum_pnl = 0.0;
    let mut peak = f64::NEG_INFINITY;
    let mut wins = 0usize;

    for (end_time, trades) in windows {
        // Any trade in the window carries the same ground-truth
        // resolution; derive it from the first.
        let first = trades[0];
        let resolved = match (first.trade.side, first.trade.is_win()) {
            (Side::Up, true) | (Side::Down, false) => Resolution::Up,
            (Side::Up, false) | (Side::Down, true) => Resolution::Down,
        };

        let (up, dn): (Vec<&&PricedTrade>, Vec<&&PricedTrade>) = trades
            .iter()
            .partition(|p| p.trade.side == Side::Up);

        let up_pnl: f64 = up.iter().map(|p| p.pnl).sum();
        let dn_pnl: f64 = dn.iter().map(|p| p.pnl).sum();
        let total_pnl = up_pnl + dn_pnl;

        cum_pnl += total_pnl;
        if cum_pnl > peak {
            peak = cum_pnl;
        }
        let win = total_pnl > 0.0;
        if win {
            wins += 1;
        }
        let windows_seen = rows.len() + 1;

        rows.push(WindowSummary {
            end_time,
            resolved,
            total_trades: trades.len(),
            up_trades: up.len(),
            dn_trades: dn.len(),
            up_avg_entry: mean_entry(&up),
            dn_avg_entry: mean_entry(&dn),
            up_pnl,
            dn_pnl,
            total_pnl,
            cum_pnl,
            drawdown: peak - cum_pnl,
            win,
            win_rate: wins as f64 / windows_seen as f64,
        });
    }

    rows
}

fn mean_entry(trades: &[&&PricedTrade]) -> Option<f64> {
    if trades.is_empty() {
        return None;
    }
    let sum: f64 = trades.iter().map(|p| p.trade.entry_price).sum();
    Some(sum / trades.len() as f64)
}
