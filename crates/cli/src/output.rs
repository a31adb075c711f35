//! CSV writers for the backtest output tables.
//!
//! Ledger columns are the fixed trade fields, a `balance` column only
//! when the run used the percentage policy, then the sorted union of
//! pass-through metadata keys. Absent values serialize as empty
//! fields; timestamps are RFC 3339.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use tracing::info;
use updown_backtest::{PricedTrade, WindowSummary};

/// Writes the trade ledger to a CSV file.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_ledger_csv(path: &Path, ledger: &[PricedTrade]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating ledger CSV {}", path.display()))?;
    write_ledger(&mut writer, ledger)?;
    writer.flush()?;
    info!(path = %path.display(), rows = ledger.len(), "wrote trade ledger");
    Ok(())
}

/// Writes the window summary to a CSV file.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_summary_csv(path: &Path, summary: &[WindowSummary]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating summary CSV {}", path.display()))?;
    write_summary(&mut writer, summary)?;
    writer.flush()?;
    info!(path = %path.display(), rows = summary.len(), "wrote window summary");
    Ok(())
}

fn write_ledger<W: Write>(writer: &mut csv::Writer<W>, ledger: &[PricedTrade]) -> Result<()> {
    let has_balance = ledger.iter().any(|p| p.balance.is_some());
    let meta_keys: BTreeSet<&str> = ledger
        .iter()
        .flat_map(|p| p.trade.meta.keys().map(String::as_str))
        .collect();

    let mut header = vec![
        "timestamp",
        "side",
        "entry_price",
        "settlement",
        "start_time",
        "end_time",
        "bet_size",
        "fee",
        "qty",
        "pnl",
    ];
    if has_balance {
        header.push("balance");
    }
    header.extend(meta_keys.iter().copied());
    writer.write_record(&header)?;

    for priced in ledger {
        let trade = &priced.trade;
        let mut record = vec![
            trade.timestamp.to_rfc3339(),
            trade.side.label().to_string(),
            trade.entry_price.to_string(),
            trade.settlement.to_string(),
            trade.start_time.to_rfc3339(),
            trade.end_time.to_rfc3339(),
            priced.bet_size.to_string(),
            priced.fee.to_string(),
            priced.qty.to_string(),
            priced.pnl.to_string(),
        ];
        if has_balance {
            record.push(priced.balance.map(|b| b.to_string()).unwrap_or_default());
        }
        for key in &meta_keys {
            record.push(trade.meta.get(*key).cloned().unwrap_or_default());
        }
        writer.write_record(&record)?;
    }
    Ok(())
}

fn write_summary<W: Write>(writer: &mut csv::Writer<W>, summary: &[WindowSummary]) -> Result<()> {
    writer.write_record([
        "end_time",
        "resolved",
        "total_trades",
        "up_trades",
        "dn_trades",
        "up_avg_entry",
        "dn_avg_entry",
        "up_pnl",
        "dn_pnl",
        "total_pnl",
        "cum_pnl",
        "drawdown",
        "win",
        "win_rate",
    ])?;

    for row in summary {
        writer.write_record([
            row.end_time.to_rfc3339(),
            row.resolved.as_str().to_string(),
            row.total_trades.to_string(),
            row.up_trades.to_string(),
            row.dn_trades.to_string(),
            row.up_avg_entry.map(|v| v.to_string()).unwrap_or_default(),
            row.dn_avg_entry.map(|v| v.to_string()).unwrap_or_default(),
            row.up_pnl.to_string(),
            row.dn_pnl.to_string(),
            row.total_pnl.to_string(),
            row.cum_pnl.to_string(),
            row.drawdown.to_string(),
            row.win.to_string(),
            row.win_rate.to_string(),
        ])?;
    }
    Ok(())
}
