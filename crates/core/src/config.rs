//! Backtest configuration.

use crate::error::BacktestError;
use serde::{Deserialize, Serialize};

/// Default closed entry-price bounds `[pmin, pmax]`.
pub const DEFAULT_PRICE_BOUNDS: (f64, f64) = (0.01, 0.99);

/// How each trade's stake is determined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SizingPolicy {
    /// Stake a fraction of the running balance per settlement window,
    /// compounding window results in chronological order.
    Percent {
        /// Starting account balance (> 0).
        initial_balance: f64,
        /// Fraction of the balance staked per window.
        bet_pct: f64,
    },
    /// Stake a constant dollar amount on every trade.
    Fixed {
        /// Stake per trade (> 0).
        bet_size: f64,
    },
}

/// Configuration for a backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Closed entry-price bounds; trades priced outside are dropped
    /// as unfillable.
    pub price_bounds: (f64, f64),
    /// Multiplicative price worsening in basis points.
    pub slippage_bps: f64,
    /// Whether the per-share fee curve is applied.
    pub fee_enabled: bool,
    /// Position sizing policy.
    pub sizing: SizingPolicy,
}

impl BacktestConfig {
    /// Creates a percentage-of-balance config with default bounds,
    /// zero slippage, and fees enabled.
    #[must_use]
    pub fn percent(initial_balance: f64, bet_pct: f64) -> Self {
        Self {
            price_bounds: DEFAULT_PRICE_BOUNDS,
            slippage_bps: 0.0,
            fee_enabled: true,
            sizing: SizingPolicy::Percent {
                initial_balance,
                bet_pct,
            },
        }
    }

    /// Creates a fixed-stake config with default bounds, zero
    /// slippage, and fees enabled.
    #[must_use]
    pub fn fixed(bet_size: f64) -> Self {
        Self {
            price_bounds: DEFAULT_PRICE_BOUNDS,
            slippage_bps: 0.0,
            fee_enabled: true,
            sizing: SizingPolicy::Fixed { bet_size },
        }
    }

    /// Sets the closed entry-price bounds.
    #[must_use]
    pub fn with_price_bounds(mut self, pmin: f64, pmax: f64) -> Self {
        self.price_bounds = (pmin, pmax);
        self
    }

    /// Sets the slippage rate in basis points.
    #[must_use]
    pub fn with_slippage_bps(mut self, bps: f64) -> Self {
        self.slippage_bps = bps;
        self
    }

    /// Enables or disables the fee curve.
    #[must_use]
    pub fn with_fee_enabled(mut self, enabled: bool) -> Self {
        self.fee_enabled = enabled;
        self
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    /// Returns `BacktestError::InvalidConfig` if the price bounds are
    /// inverted or a sizing amount is not positive.
    pub fn validate(&self) -> Result<(), BacktestError> {
        let (pmin, pmax) = self.price_bounds;
        if !(pmin.is_finite() && pmax.is_finite()) || pmin > pmax {
            return Err(BacktestError::InvalidConfig(format!(
                "price bounds ({pmin}, {pmax}) must be a finite, non-inverted pair"
            )));
        }
        match self.sizing {
            SizingPolicy::Percent {
                initial_balance, ..
            } => {
                if initial_balance <= 0.0 {
                    return Err(BacktestError::InvalidConfig(format!(
                        "initial_balance must be positive, got {initial_balance}"
                    )));
                }
            }
            SizingPolicy::Fixed { bet_size } => {
                if bet_size <= 0.0 {
                    return Err(BacktestError::InvalidConfig(format!(
                        "bet_size must be positive, got {bet_size}"
                    )));
                }
            }
        }
        Ok(())
    }
}
