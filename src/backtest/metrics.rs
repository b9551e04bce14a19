//! Trade and equity-curve statistics.
//!
//! Trade returns are in percent. Ratios are annualised with `sqrt(12)`
//! regardless of the sampling interval.

use serde::Serialize;

use crate::stats::{mean, std_dev};

pub(crate) const ANNUALIZATION: f64 = 3.464_101_615_137_754_6; // sqrt(12)

/// `mean / std * sqrt(12)`; `0.0` when the spread is zero.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    let spread = std_dev(returns);
    if spread > 0.0 {
        mean(returns) / spread * ANNUALIZATION
    } else {
        0.0
    }
}

/// Like [`sharpe_ratio`] but divided by the spread of losing returns only.
pub fn sortino_ratio(returns: &[f64]) -> f64 {
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let spread = std_dev(&downside);
    if spread > 0.0 {
        mean(returns) / spread * ANNUALIZATION
    } else {
        0.0
    }
}

/// Winning share of all returns, in percent.
pub fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let wins = returns.iter().filter(|r| **r > 0.0).count();
    wins as f64 / returns.len() as f64 * 100.0
}

/// Gross winning percent over gross losing percent; `0.0` without losses.
pub fn profit_factor(returns: &[f64]) -> f64 {
    let gross_profit: f64 = returns.iter().filter(|r| **r > 0.0).sum();
    let gross_loss: f64 = returns.iter().filter(|r| **r < 0.0).map(|r| r.abs()).sum();
    if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Drawdown {
    /// Largest peak-to-trough fall in currency units.
    pub amount: f64,
    /// The same fall relative to its peak, in percent.
    pub pct: f64,
}

/// Largest absolute drawdown of an equity curve, with its relative size.
pub fn max_drawdown(equity_curve: &[f64]) -> Drawdown {
    let Some(&first) = equity_curve.first() else {
        return Drawdown::default();
    };

    let mut peak = first;
    let mut worst = Drawdown::default();
    for &equity in &equity_curve[1..] {
        if equity > peak {
            peak = equity;
        }
        let amount = peak - equity;
        if amount > worst.amount && peak > 0.0 {
            worst = Drawdown {
                amount,
                pct: amount / peak * 100.0,
            };
        }
    }
    worst
}

/// Largest relative drawdown of a value series, in percent.
pub fn max_drawdown_pct(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut peak = values[0];
    let mut max_drawdown = 0.0;
    for value in values {
        if *value > peak {
            peak = *value;
        }
        if peak <= 0.0 {
            continue;
        }
        let drawdown = (peak - *value) / peak;
        if drawdown > max_drawdown {
            max_drawdown = drawdown;
        }
    }
    max_drawdown * 100.0
}
