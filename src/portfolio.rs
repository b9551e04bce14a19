//! Equal-weight portfolio statistics over several price series.

use error_stack::{Report, bail};
use serde::Serialize;

use crate::backtest::metrics::{ANNUALIZATION, max_drawdown_pct};
use crate::error::AnalysisError;
use crate::model::{PriceSeries, simple_returns};
use crate::stats::{correlation, std_dev};

#[derive(Debug, Clone, Serialize)]
pub struct HoldingSummary {
    pub name: String,
    pub current_price: f64,
    pub weight: f64,
    pub total_return_pct: f64,
    /// Annualised standard deviation of period returns.
    pub volatility: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairCorrelation {
    pub first: String,
    pub second: String,
    pub correlation: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioReport {
    pub holdings: Vec<HoldingSummary>,
    pub correlations: Vec<PairCorrelation>,
    pub total_return_pct: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub diversification_ratio: f64,
    pub max_drawdown_pct: f64,
}

/// Analyse named series as an equally weighted portfolio.
pub fn analyze(series: &[(String, PriceSeries)]) -> Result<PortfolioReport, Report<AnalysisError>> {
    if series.len() < 2 {
        bail!(AnalysisError::InsufficientData {
            required: 2,
            available: series.len(),
        });
    }

    let weight = 1.0 / series.len() as f64;
    let returns: Vec<Vec<f64>> = series.iter().map(|(_, s)| simple_returns(&s.prices)).collect();
    let spreads: Vec<f64> = returns.iter().map(|r| std_dev(r)).collect();

    let holdings: Vec<HoldingSummary> = series
        .iter()
        .zip(&spreads)
        .map(|((name, s), spread)| {
            let first = s.prices[0];
            HoldingSummary {
                name: name.clone(),
                current_price: s.last_price(),
                weight,
                total_return_pct: (s.last_price() - first) / first * 100.0,
                volatility: spread * ANNUALIZATION,
            }
        })
        .collect();

    let mut correlations = Vec::new();
    let mut variance: f64 = spreads.iter().map(|s| (weight * s).powi(2)).sum();
    for i in 0..series.len() {
        for j in i + 1..series.len() {
            let rho = correlation(&returns[i], &returns[j]);
            variance += 2.0 * weight * weight * spreads[i] * spreads[j] * rho;
            correlations.push(PairCorrelation {
                first: series[i].0.clone(),
                second: series[j].0.clone(),
                correlation: rho,
            });
        }
    }

    // negative rounding residue is treated as zero variance
    let volatility = variance.max(0.0).sqrt() * ANNUALIZATION;
    let total_return_pct: f64 = holdings.iter().map(|h| h.total_return_pct * h.weight).sum();
    let weighted_volatility: f64 = holdings.iter().map(|h| h.volatility * h.weight).sum();

    let sharpe_ratio = if volatility > 0.0 {
        total_return_pct / volatility
    } else {
        0.0
    };
    let diversification_ratio = if volatility > 0.0 {
        weighted_volatility / volatility
    } else {
        1.0
    };

    let common = series.iter().map(|(_, s)| s.len()).min().unwrap_or_default();
    let values: Vec<f64> = (0..common)
        .map(|i| series.iter().map(|(_, s)| s.prices[i] * weight).sum())
        .collect();

    tracing::info!(
        holdings = series.len(),
        total_return_pct,
        volatility,
        "portfolio analysed"
    );

    Ok(PortfolioReport {
        holdings,
        correlations,
        total_return_pct,
        volatility,
        sharpe_ratio,
        diversification_ratio,
        max_drawdown_pct: max_drawdown_pct(&values),
    })
}
