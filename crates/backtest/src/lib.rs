//! Backtesting engine for binary up/down prediction markets.
//!
//! Simulates opening positions against historical order-book
//! snapshots of two-outcome markets, prices them under a nonlinear
//! per-share fee curve and one of two sizing policies, and produces
//! a trade-level ledger plus a per-settlement-window summary.
//!
//! Pipeline: trade builder → position sizer (invoking the fee curve
//! per trade) → summary aggregator. Data flows strictly downstream;
//! each stage returns fresh tables.

pub mod builder;
pub mod data;
pub mod engine;
pub mod fees;
pub mod sizer;
pub mod summary;
pub mod trade;

pub use builder::build_trades;
pub use data::{load_snapshot_csv, read_snapshot_csv, SnapshotCsv, REQUIRED_COLUMNS};
pub use engine::{BacktestEngine, BacktestReport};
pub use fees::FeeCurve;
pub use sizer::{size_fixed, size_percent};
pub use summary::{summarize, WindowSummary};
pub use trade::{PricedTrade, Trade};
