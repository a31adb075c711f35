//! CSV loading for snapshot tables.
//!
//! The snapshot CSV is keyed by a `timestamp` column (the snapshot
//! time index). Missing any required column is a fatal input error;
//! duplicate timestamps are dropped first-wins; rows are sorted
//! ascending. Extra columns named in the pass-through allow-list are
//! captured into each snapshot's metadata bag, and boolean signal
//! columns can be lifted into aligned entry signals.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::info;
use updown_core::{dedup_snapshots, BacktestError, BookSnapshot, EntrySignal, Resolution};

/// Columns every snapshot CSV must carry.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "timestamp",
    "start_time",
    "end_time",
    "resolved",
    "up_best_ask",
    "down_best_ask",
];

/// A parsed snapshot CSV: the snapshot table plus any signal columns
/// lifted out of it.
#[derive(Debug, Clone)]
pub struct SnapshotCsv {
    /// De-duplicated snapshots, ascending by timestamp.
    pub snapshots: Vec<BookSnapshot>,
    /// Up-side entry signal, if a signal column was requested.
    pub up_signal: Option<EntrySignal>,
    /// Down-side entry signal, if a signal column was requested.
    pub down_signal: Option<EntrySignal>,
}

/// Loads a snapshot CSV from disk.
///
/// # Errors
/// Returns an error if the file cannot be read, a required column is
/// missing, a requested signal column is absent, or a row fails to
/// parse.
pub fn load_snapshot_csv(
    path: &Path,
    passthrough: &[String],
    up_col: Option<&str>,
    down_col: Option<&str>,
) -> Result<SnapshotCsv> {
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening snapshot CSV {}", path.display()))?;
    let parsed = read_snapshot_csv(reader, passthrough, up_col, down_col)?;
    info!(
        path = %path.display(),
        rows = parsed.snapshots.len(),
        "loaded snapshot table"
    );
    Ok(parsed)
}

/// Parses a snapshot CSV from any reader.
///
/// # Errors
/// See [`load_snapshot_csv`].
pub fn read_snapshot_csv<R: Read>(
    mut reader: csv::Reader<R>,
    passthrough: &[String],
    up_col: Option<&str>,
    down_col: Option<&str>,
) -> Result<SnapshotCsv> {
    let headers = reader.headers()?.clone();
    let columns: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| !columns.contains_key(**name))
        .map(|name| (*name).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(BacktestError::MissingColumns(missing).into());
    }

    let signal_idx = |col: Option<&str>| -> Result<Option<usize>> {
        match col {
            None => Ok(None),
            Some(name) => match columns.get(name) {
                Some(&idx) => Ok(Some(idx)),
                None => bail!("signal column {name:?} not found in snapshot CSV"),
            },
        }
    };
    let up_idx = signal_idx(up_col)?;
    let down_idx = signal_idx(down_col)?;

    let meta_columns: Vec<(String, usize)> = passthrough
        .iter()
        .filter_map(|name| columns.get(name.as_str()).map(|&idx| (name.clone(), idx)))
        .collect();

    let mut snapshots = Vec::new();
    let mut up_pairs = Vec::new();
    let mut down_pairs = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("reading snapshot row {row}"))?;
        let timestamp: DateTime<Utc> = record[columns["timestamp"]]
            .parse()
            .with_context(|| format!("parsing timestamp in row {row}"))?;
        let start_time: DateTime<Utc> = record[columns["start_time"]]
            .parse()
            .with_context(|| format!("parsing start_time in row {row}"))?;
        let end_time: DateTime<Utc> = record[columns["end_time"]]
            .parse()
            .with_context(|| format!("parsing end_time in row {row}"))?;
        let resolved = Resolution::parse(&record[columns["resolved"]]);
        let up_best_ask = parse_optional_price(&record[columns["up_best_ask"]]);
        let down_best_ask = parse_optional_price(&record[columns["down_best_ask"]]);

        let mut snapshot = BookSnapshot::new(
            timestamp,
            start_time,
            end_time,
            resolved,
            up_best_ask,
            down_best_ask,
        );
        for (name, idx) in &meta_columns {
            snapshot
                .meta
                .insert(name.clone(), record[*idx].to_string());
        }

        if let Some(idx) = up_idx {
            up_pairs.push((timestamp, parse_bool(&record[idx])));
        }
        if let Some(idx) = down_idx {
            down_pairs.push((timestamp, parse_bool(&record[idx])));
        }

        snapshots.push(snapshot);
    }

    let mut snapshots = dedup_snapshots(snapshots);
    snapshots.sort_by_key(|s| s.timestamp);

    Ok(SnapshotCsv {
        snapshots,
        up_signal: up_idx.map(|_| EntrySignal::from_pairs(up_pairs)),
        down_signal: down_idx.map(|_| EntrySignal::from_pairs(down_pairs)),
    })
}

fn parse_optional_price(field: &str) -> Option<f64> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|p| p.is_finite())
}

fn parse_bool(field: &str) -> bool {
    matches!(
        field.trim().to_ascii_lowercase().as_str(),
        "true" | "t" | "1" | "yes"
    )
}
