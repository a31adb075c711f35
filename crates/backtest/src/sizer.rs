//! Position sizing policies.
//!
//! Both policies share the trade-level mechanics: gross quantity is
//! `bet_size / entry_price`, the fee curve converts gross shares to a
//! fee in shares, and `pnl = qty * settlement - bet_size`. They
//! differ only in where `bet_size` comes from.
//!
//! The percentage policy compounds: settlement windows are processed
//! in ascending `end_time` order, each window's stake is sized from
//! the balance accumulated over all prior windows, and the balance is
//! clamped to zero if a window's loss would drive it negative (a
//! zeroed account never reactivates; later windows contribute
//! nothing). This fold is the one place in the engine where row order
//! is load-bearing.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::fees::FeeCurve;
use crate::trade::{PricedTrade, Trade};

/// Prices the ledger under the compounding percentage-of-balance
/// policy.
///
/// Every trade in a window shares that window's pre-update balance,
/// recorded on the trade as `balance`.
#[must_use]
pub fn size_percent(
    trades: Vec<Trade>,
    initial_balance: f64,
    bet_pct: f64,
    fee_enabled: bool,
    fee: &FeeCurve,
) -> Vec<PricedTrade> {
    if trades.is_empty() {
        return Vec::new();
    }

    // Per-window sums of fee-adjusted net returns on one unit of stake.
    let mut windows: BTreeMap<DateTime<Utc>, (f64, usize)> = BTreeMap::new();
    for trade in &trades {
        let factor = if fee_enabled {
            fee.factor(trade.entry_price)
        } else {
            0.0
        };
        let net_return = (1.0 - factor) * trade.settlement / trade.entry_price - 1.0;
        let entry = windows.entry(trade.end_time).or_insert((0.0, 0));
        entry.0 += net_return;
        entry.1 += 1;
    }

    // Sequential compounding fold over windows in ascending end_time
    // order, recording each window's pre-update balance.
    let mut pre_balances: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
    let mut balance = initial_balance;
    for (&end_time, &(return_sum, count)) in &windows {
        pre_balances.insert(end_time, balance);
        balance += balance * bet_pct * return_sum;
        if balance < 0.0 {
            balance = 0.0;
        }
        tracing::trace!(%end_time, count, return_sum, balance, "window compounded");
    }

    trades
        .into_iter()
        .map(|trade| {
            let window_balance = pre_balances[&trade.end_time];
            price_trade(
                trade,
                window_balance * bet_pct,
                fee_enabled,
                fee,
                Some(window_balance),
            )
        })
        .collect()
}

/// Prices the ledger under the fixed dollar-stake policy.
///
/// Trades are mutually independent; no running balance exists.
#[must_use]
pub fn size_fixed(
    trades: Vec<Trade>,
    bet_size: f64,
    fee_enabled: bool,
    fee: &FeeCurve,
) -> Vec<PricedTrade> {
    trades
        .into_iter()
        .map(|trade| price_trade(trade, bet_size, fee_enabled, fee, None))
        .collect()
}

fn price_trade(
    trade: Trade,
    bet_size: f64,
    fee_enabled: bool,
    fee: &FeeCurve,
    balance: Option<f64>,
) -> PricedTrade {
    let gross_qty = bet_size / trade.entry_price;
    let fee_shares = if fee_enabled {
        fee.fee_shares(gross_qty, trade.entry_price)
    } else {
        0.0
    };
    let qty = gross_qty - fee_shares;
    let pnl = qty * trade.settlement - bet_size;
    PricedTrade {
        trade,
        bet_size,
        fee: fee_shares,
        qty,
        pnl,
        balance,
    }
}
