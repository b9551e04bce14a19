//! Information and "thermodynamic" estimators over price and change series.
//!
//! The physical vocabulary is heuristic; formulas are kept exactly as the
//! analysis model defines them.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::model::{EnergyState, simple_returns};
use crate::stats::{iqr, mean, std_dev};

/// Entropy estimator selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntropyEstimator {
    /// Equal-width histogram.
    Binned,
    /// Gaussian kernel density evaluated at bin centres.
    Kernel,
}

impl EntropyEstimator {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "binned" => Some(Self::Binned),
            "kernel" => Some(Self::Kernel),
            _ => None,
        }
    }

    pub fn estimate(self, values: &[f64], bins: usize) -> f64 {
        match self {
            Self::Binned => shannon_entropy(values, bins),
            Self::Kernel => kernel_density_entropy(values, bins),
        }
    }
}

/// Binned Shannon entropy in bits, bounded by `log2(bins)`.
pub fn shannon_entropy(values: &[f64], bins: usize) -> f64 {
    if values.len() < 2 || bins == 0 {
        return 0.0;
    }
    let (min, max) = value_range(values);
    let bin_size = (max - min) / bins as f64;
    if bin_size == 0.0 {
        return 0.0;
    }

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - min) / bin_size).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let n = values.len() as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.log2()
        })
        .sum()
}

/// Shannon entropy of a Gaussian kernel density sampled at `bins` centres.
///
/// When Silverman's bandwidth degenerates to zero (e.g. more than half the
/// samples identical) the bin width is used instead.
pub fn kernel_density_entropy(values: &[f64], bins: usize) -> f64 {
    if values.len() < 2 || bins == 0 {
        return 0.0;
    }
    let (min, max) = value_range(values);
    let bin_size = (max - min) / bins as f64;
    if bin_size == 0.0 {
        return 0.0;
    }

    let silverman = silverman_bandwidth(values);
    let bandwidth = if silverman > 0.0 && silverman.is_finite() {
        silverman
    } else {
        bin_size
    };
    let norm = bandwidth * (2.0 * PI).sqrt();

    let mut density: Vec<f64> = (0..bins)
        .map(|i| {
            let center = min + (i as f64 + 0.5) * bin_size;
            values
                .iter()
                .map(|&v| (-0.5 * ((v - center) / bandwidth).powi(2)).exp() / norm)
                .sum()
        })
        .collect();

    let total: f64 = density.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return 0.0;
    }
    density.iter_mut().for_each(|d| *d /= total);

    density
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| -p * p.log2())
        .sum()
}

/// Silverman's rule of thumb: `0.9 * min(std, IQR / 1.34) * n^-0.2`.
pub fn silverman_bandwidth(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let spread = std_dev(values).min(iqr(values) / 1.34);
    0.9 * spread * (values.len() as f64).powf(-0.2)
}

/// Energy barrier as mean absolute return scaled by the range-to-mean ratio.
pub fn energy_barrier(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }
    let abs_returns: Vec<f64> = simple_returns(prices).iter().map(|r| r.abs()).collect();
    let (min, max) = value_range(prices);
    let avg_price = mean(prices);
    if avg_price == 0.0 {
        return 0.0;
    }
    mean(&abs_returns) * ((max - min) / avg_price)
}

/// Free-energy barrier `max(0, ΔH - T·ΔS)` with `ΔH = mean|r|`,
/// `T = std(|r|)` and `ΔS = entropy / log2(N)`.
pub fn thermodynamic_energy_barrier(prices: &[f64], entropy: f64) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }
    let abs_returns: Vec<f64> = simple_returns(prices).iter().map(|r| r.abs()).collect();
    let delta_h = mean(&abs_returns);
    let temperature = std_dev(&abs_returns);
    let delta_s = entropy / (prices.len() as f64).log2();
    (delta_h - temperature * delta_s).max(0.0)
}

/// Volatility of the unexpected component: `sqrt(Σ_{i≥1} u[i]² / len(u))`.
pub fn market_temperature(unexpected: &[f64]) -> f64 {
    if unexpected.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = unexpected[1..].iter().map(|u| u * u).sum();
    (sum_sq / unexpected.len() as f64).sqrt()
}

/// Volatility of period-over-period returns.
pub fn thermodynamic_temperature(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }
    std_dev(&simple_returns(prices))
}

/// Energy state of every price relative to the first one.
pub fn price_energy_states(prices: &[f64]) -> Vec<EnergyState> {
    if prices.len() < 2 {
        return Vec::new();
    }
    let baseline = prices[0];
    prices
        .iter()
        .map(|&p| EnergyState::new(p, baseline))
        .collect()
}

fn value_range(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}
