//! Trade builder: book snapshots + entry signals → candidate trades.
//!
//! For each snapshot where a side's signal fired, selects that side's
//! ask, worsens it by the slippage rate, and derives the settlement
//! value from the window's resolution. Candidates are concatenated
//! (up side first), stably sorted by the snapshot time index, and
//! filtered to the closed price-bound interval. Rows with an
//! undefined price or settlement are dropped, not errors: the market
//! may simply not have resolved yet.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use updown_core::{BacktestError, BookSnapshot, EntrySignal, Side};

use crate::trade::Trade;

/// Builds the chronologically ordered pre-sizing trade table.
///
/// Either signal may be absent; no fired signals yields an empty
/// table. Duplicate snapshot timestamps are dropped first-wins before
/// any signal alignment.
///
/// # Errors
/// Returns `BacktestError::SignalLengthMismatch` if a raw signal
/// array does not match the (de-duplicated) snapshot row count.
pub fn build_trades(
    snapshots: &[BookSnapshot],
    up_signal: Option<&EntrySignal>,
    down_signal: Option<&EntrySignal>,
    price_bounds: (f64, f64),
    slippage_bps: f64,
) -> Result<Vec<Trade>, BacktestError> {
    let mut seen: HashSet<DateTime<Utc>> = HashSet::with_capacity(snapshots.len());
    let rows: Vec<&BookSnapshot> = snapshots
        .iter()
        .filter(|s| seen.insert(s.timestamp))
        .collect();
    let index: Vec<DateTime<Utc>> = rows.iter().map(|s| s.timestamp).collect();

    let up_fired = resolve_signal(up_signal, &index)?;
    let down_fired = resolve_signal(down_signal, &index)?;

    let slip = 1.0 + slippage_bps / 10_000.0;
    let mut candidates: Vec<Trade> = Vec::new();
    let mut dropped_undefined = 0usize;

    // Up-side candidates first, then down; the stable sort below
    // interleaves them by time index without reordering within a key.
    for (side, fired) in [(Side::Up, &up_fired), (Side::Down, &down_fired)] {
        let Some(fired) = fired else { continue };
        for (row, &hit) in rows.iter().zip(fired.iter()) {
            if !hit {
                continue;
            }
            match (row.best_ask(side), row.resolved.settlement_for(side)) {
                (Some(ask), Some(settlement)) if ask.is_finite() => {
                    candidates.push(Trade {
                        timestamp: row.timestamp,
                        side,
                        entry_price: ask * slip,
                        settlement,
                        start_time: row.start_time,
                        end_time: row.end_time,
                        meta: row.meta.clone(),
                    });
                }
                _ => dropped_undefined += 1,
            }
        }
    }

    candidates.sort_by_key(|t| t.timestamp);

    let (pmin, pmax) = price_bounds;
    let before_bounds = candidates.len();
    candidates.retain(|t| t.entry_price >= pmin && t.entry_price <= pmax);
    let dropped_bounds = before_bounds - candidates.len();

    if dropped_undefined > 0 || dropped_bounds > 0 {
        tracing::debug!(
            dropped_undefined,
            dropped_bounds,
            kept = candidates.len(),
            "filtered trade candidates"
        );
    }

    Ok(candidates)
}

fn resolve_signal(
    signal: Option<&EntrySignal>,
    index: &[DateTime<Utc>],
) -> Result<Option<Vec<bool>>, BacktestError> {
    signal.map(|s| s.resolve(index)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use updown_core::Resolution;

    const BOUNDS: (f64, f64) = (0.01, 0.99);

    fn ts(min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, min, 0).unwrap()
    }

    fn snapshot(min: u32, resolved: Resolution, up_ask: f64, down_ask: f64) -> BookSnapshot {
        BookSnapshot::new(ts(min), ts(0), ts(15), resolved, Some(up_ask), Some(down_ask))
    }

    fn all_fired(n: usize) -> EntrySignal {
        EntrySignal::Raw(vec![true; n])
    }

    // ============================================================
    // Signal Handling Tests
    // ============================================================

    #[test]
    fn no_signals_yields_empty_table() {
        let snaps = vec![snapshot(1, Resolution::Up, 0.40, 0.62)];
        let trades = build_trades(&snaps, None, None, BOUNDS, 0.0).unwrap();
        assert!(trades.is_empty());
    }

    #[test]
    fn unfired_signals_yield_empty_table() {
        let snaps = vec![snapshot(1, Resolution::Up, 0.40, 0.62)];
        let signal = EntrySignal::Raw(vec![false]);
        let trades = build_trades(&snaps, Some(&signal), Some(&signal), BOUNDS, 0.0).unwrap();
        assert!(trades.is_empty());
    }

    #[test]
    fn raw_signal_length_mismatch_is_fatal() {
        let snaps = vec![snapshot(1, Resolution::Up, 0.40, 0.62)];
        let signal = EntrySignal::Raw(vec![true, true]);
        let err = build_trades(&snaps, Some(&signal), None, BOUNDS, 0.0).unwrap_err();
        assert!(matches!(err, BacktestError::SignalLengthMismatch { .. }));
    }

    #[test]
    fn raw_signal_length_checked_after_dedup() {
        // Two rows share a timestamp; the de-duplicated index has 2 rows.
        let snaps = vec![
            snapshot(1, Resolution::Up, 0.40, 0.62),
            snapshot(1, Resolution::Up, 0.41, 0.61),
            snapshot(2, Resolution::Up, 0.45, 0.57),
        ];
        let signal = EntrySignal::Raw(vec![true, true]);
        let trades = build_trades(&snaps, Some(&signal), None, BOUNDS, 0.0).unwrap();
        assert_eq!(trades.len(), 2);
        // first occurrence of the duplicated key wins
        assert!((trades[0].entry_price - 0.40).abs() < 1e-12);
    }

    // ============================================================
    // Price And Settlement Tests
    // ============================================================

    #[test]
    fn up_trade_uses_up_ask_and_up_settlement() {
        let snaps = vec![snapshot(1, Resolution::Up, 0.40, 0.62)];
        let trades = build_trades(&snaps, Some(&all_fired(1)), None, BOUNDS, 0.0).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, Side::Up);
        assert!((trades[0].entry_price - 0.40).abs() < 1e-12);
        assert!((trades[0].settlement - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn down_settlement_is_complement_of_up_outcome() {
        let snaps = vec![snapshot(1, Resolution::Up, 0.40, 0.62)];
        let trades = build_trades(&snaps, None, Some(&all_fired(1)), BOUNDS, 0.0).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, Side::Down);
        assert!((trades[0].entry_price - 0.62).abs() < 1e-12);
        assert!((trades[0].settlement - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn slippage_worsens_price_multiplicatively() {
        let snaps = vec![snapshot(1, Resolution::Up, 0.40, 0.62)];
        let trades = build_trades(&snaps, Some(&all_fired(1)), None, BOUNDS, 50.0).unwrap();
        // 0.40 * (1 + 50/10000) = 0.402
        assert!(
            (trades[0].entry_price - 0.402).abs() < 1e-12,
            "price was {}",
            trades[0].entry_price
        );
    }

    #[test]
    fn unresolved_rows_are_dropped() {
        let snaps = vec![
            snapshot(1, Resolution::Unknown, 0.40, 0.62),
            snapshot(2, Resolution::Down, 0.45, 0.57),
        ];
        let trades = build_trades(&snaps, Some(&all_fired(2)), None, BOUNDS, 0.0).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].timestamp, ts(2));
    }

    #[test]
    fn missing_ask_is_dropped() {
        let mut snap = snapshot(1, Resolution::Up, 0.40, 0.62);
        snap.up_best_ask = None;
        let trades = build_trades(&[snap], Some(&all_fired(1)), None, BOUNDS, 0.0).unwrap();
        assert!(trades.is_empty());
    }

    // ============================================================
    // Bounds And Ordering Tests
    // ============================================================

    #[test]
    fn price_bounds_are_a_closed_interval() {
        let snaps = vec![
            snapshot(1, Resolution::Up, 0.01, 0.99), // both exactly at bounds
            snapshot(2, Resolution::Up, 0.005, 0.995), // both outside
        ];
        let up = all_fired(2);
        let down = all_fired(2);
        let trades = build_trades(&snaps, Some(&up), Some(&down), BOUNDS, 0.0).unwrap();
        assert_eq!(trades.len(), 2);
        assert!(trades.iter().all(|t| t.timestamp == ts(1)));
    }

    #[test]
    fn bounds_apply_to_slippage_adjusted_price() {
        // 0.99 ask pushed above pmax by slippage
        let snaps = vec![snapshot(1, Resolution::Up, 0.99, 0.01)];
        let trades = build_trades(&snaps, Some(&all_fired(1)), None, BOUNDS, 100.0).unwrap();
        assert!(trades.is_empty());
    }

    #[test]
    fn trades_sort_by_time_index_not_side() {
        let snaps = vec![
            snapshot(2, Resolution::Up, 0.45, 0.57),
            snapshot(1, Resolution::Up, 0.40, 0.62),
        ];
        let up = all_fired(2);
        let down = all_fired(2);
        let trades = build_trades(&snaps, Some(&up), Some(&down), BOUNDS, 0.0).unwrap();
        assert_eq!(trades.len(), 4);
        assert_eq!(trades[0].timestamp, ts(1));
        assert_eq!(trades[1].timestamp, ts(1));
        assert_eq!(trades[2].timestamp, ts(2));
        // stable sort keeps up before down within one snapshot
        assert_eq!(trades[0].side, Side::Up);
        assert_eq!(trades[1].side, Side::Down);
    }

    // ============================================================
    // Pass-Through Metadata Tests
    // ============================================================

    #[test]
    fn metadata_is_carried_onto_trades() {
        let mut snap = snapshot(1, Resolution::Up, 0.40, 0.62);
        snap.meta
            .insert("condition_id".to_string(), "0xabc".to_string());
        let trades = build_trades(&[snap], Some(&all_fired(1)), None, BOUNDS, 0.0).unwrap();
        assert_eq!(trades[0].meta["condition_id"], "0xabc");
    }
}
