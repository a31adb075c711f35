//! Backtest engine facade.
//!
//! Wires builder → sizer → summary into one batch transform. The run
//! is purely functional: identical inputs and configuration always
//! produce identical output tables, and independent runs share no
//! state.

use tracing::info;
use updown_core::{BacktestConfig, BacktestError, BookSnapshot, EntrySignal, SizingPolicy};

use crate::builder::build_trades;
use crate::fees::FeeCurve;
use crate::sizer::{size_fixed, size_percent};
use crate::summary::{summarize, WindowSummary};
use crate::trade::PricedTrade;

/// The two output tables of one backtest run.
#[derive(Debug, Clone)]
pub struct BacktestReport {
    /// One row per executed trade.
    pub ledger: Vec<PricedTrade>,
    /// One row per settlement window, ascending by `end_time`.
    pub summary: Vec<WindowSummary>,
}

/// Runs backtests for one configuration.
pub struct BacktestEngine {
    config: BacktestConfig,
    fee: FeeCurve,
}

impl BacktestEngine {
    /// Creates an engine with the default fee curve.
    #[must_use]
    pub fn new(config: BacktestConfig) -> Self {
        Self {
            config,
            fee: FeeCurve::default(),
        }
    }

    /// Replaces the fee curve.
    #[must_use]
    pub fn with_fee_curve(mut self, fee: FeeCurve) -> Self {
        self.fee = fee;
        self
    }

    /// Returns a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Runs the full pipeline over the snapshot table.
    ///
    /// A quiet input (no fired signals, or no qualifying trades) is a
    /// valid outcome: both output tables are empty.
    ///
    /// # Errors
    /// Returns an error for invalid configuration or a raw signal
    /// array whose length does not match the snapshot row count.
    pub fn run(
        &self,
        snapshots: &[BookSnapshot],
        up_signal: Option<&EntrySignal>,
        down_signal: Option<&EntrySignal>,
    ) -> Result<BacktestReport, BacktestError> {
        self.config.validate()?;

        let trades = build_trades(
            snapshots,
            up_signal,
            down_signal,
            self.config.price_bounds,
            self.config.slippage_bps,
        )?;
        let candidates = trades.len();

        let ledger = match self.config.sizing {
            SizingPolicy::Percent {
                initial_balance,
                bet_pct,
            } => size_percent(
                trades,
                initial_balance,
                bet_pct,
                self.config.fee_enabled,
                &self.fee,
            ),
            SizingPolicy::Fixed { bet_size } => {
                size_fixed(trades, bet_size, self.config.fee_enabled, &self.fee)
            }
        };

        let summary = summarize(&ledger);
        let total_pnl: f64 = summary.last().map_or(0.0, |row| row.cum_pnl);
        info!(
            snapshots = snapshots.len(),
            trades = candidates,
            windows = summary.len(),
            total_pnl,
            "backtest complete"
        );

        Ok(BacktestReport { ledger, summary })
    }
}
