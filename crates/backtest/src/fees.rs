//! Per-share fee curve for binary outcome markets.
//!
//! The fee is `qty * rate * (p(1-p))^exponent`: a convex curve that
//! is zero at the price extremes and maximal at p = 0.5, so trading
//! near even odds costs more than trading near-certain outcomes.

use serde::{Deserialize, Serialize};

/// Nonlinear fee curve, expressed in shares.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeCurve {
    /// Scale of the curve.
    pub rate: f64,
    /// Exponent applied to `p(1-p)`.
    pub exponent: f64,
}

impl Default for FeeCurve {
    fn default() -> Self {
        Self {
            rate: 0.25,
            exponent: 2.0,
        }
    }
}

impl FeeCurve {
    /// Creates a fee curve with the given rate and exponent.
    #[must_use]
    pub fn new(rate: f64, exponent: f64) -> Self {
        Self { rate, exponent }
    }

    /// Fee per gross share at the given entry price.
    ///
    /// Tolerates prices exactly at 0 or 1, where the factor is 0.
    #[must_use]
    pub fn factor(&self, entry_price: f64) -> f64 {
        self.rate * (entry_price * (1.0 - entry_price)).powf(self.exponent)
    }

    /// Fee in shares for a gross share quantity at the given price.
    #[must_use]
    pub fn fee_shares(&self, qty: f64, entry_price: f64) -> f64 {
        qty * self.factor(entry_price)
    }
}
