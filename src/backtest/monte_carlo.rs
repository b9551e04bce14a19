use error_stack::{Report, bail};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::AnalysisError;
use crate::model::simple_returns;
use crate::settings::MonteCarloSettings;
use crate::stats::{SeedPlan, mean, percentile_sorted, seeded_normal, sorted, std_dev};

const MIN_PRICES: usize = 20;
/// Simulation seeds are `sim * 1000 + step`, independent of the run seed.
const SEED_BASE: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceBands {
    pub p5: f64,
    pub p25: f64,
    pub p75: f64,
    pub p95: f64,
}

impl ConfidenceBands {
    fn from_sorted(values: &[f64]) -> Self {
        Self {
            p5: percentile_sorted(values, 0.05),
            p25: percentile_sorted(values, 0.25),
            p75: percentile_sorted(values, 0.75),
            p95: percentile_sorted(values, 0.95),
        }
    }
}

/// Price distribution across all paths after `step` periods.
#[derive(Debug, Clone, Serialize)]
pub struct PriceBand {
    pub step: usize,
    pub median: f64,
    pub bands: ConfidenceBands,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloResult {
    pub simulations: usize,
    pub horizon: usize,
    /// Final return of every path in percent, in simulation order.
    pub final_returns: Vec<f64>,
    pub mean_return: f64,
    pub std_return: f64,
    pub confidence: ConfidenceBands,
    pub var95: f64,
    pub var99: f64,
    pub expected_shortfall: f64,
    pub price_bands: Vec<PriceBand>,
}

/// Simulate `settings.simulations` independent paths of `settings.horizon`
/// periods from the last price, with normal returns fitted to history.
///
/// Paths are evaluated in parallel; each depends only on its own index.
pub fn run(
    prices: &[f64],
    settings: MonteCarloSettings,
) -> Result<MonteCarloResult, Report<AnalysisError>> {
    if prices.len() < MIN_PRICES {
        bail!(AnalysisError::InsufficientData {
            required: MIN_PRICES,
            available: prices.len(),
        });
    }
    if settings.simulations == 0 || settings.horizon == 0 {
        bail!(AnalysisError::InvalidInput {
            reason: "monte carlo needs at least one simulation and one step".into(),
        });
    }

    let returns = simple_returns(prices);
    let mu = mean(&returns);
    let sigma = std_dev(&returns);
    let start = prices[prices.len() - 1];
    let plan = SeedPlan::new(SEED_BASE);

    let paths: Vec<Vec<f64>> = (0..settings.simulations)
        .into_par_iter()
        .map(|sim| simulate_path(start, mu, sigma, settings.horizon, plan, sim as u64))
        .collect();

    let final_returns: Vec<f64> = paths
        .iter()
        .map(|path| {
            let last = path.last().copied().unwrap_or(start);
            (last - start) / start * 100.0
        })
        .collect();
    let ordered = sorted(&final_returns);

    let confidence = ConfidenceBands::from_sorted(&ordered);
    let var95 = confidence.p5;
    let var99 = percentile_sorted(&ordered, 0.01);
    let tail: Vec<f64> = final_returns.iter().copied().filter(|r| *r <= var95).collect();
    let expected_shortfall = mean(&tail);

    let price_bands = (1..=settings.horizon)
        .map(|step| {
            let at_step: Vec<f64> = paths.iter().map(|path| path[step]).collect();
            let ordered = sorted(&at_step);
            PriceBand {
                step,
                median: percentile_sorted(&ordered, 0.5),
                bands: ConfidenceBands::from_sorted(&ordered),
            }
        })
        .collect();

    tracing::info!(
        simulations = settings.simulations,
        horizon = settings.horizon,
        var95,
        "monte carlo simulation complete"
    );

    Ok(MonteCarloResult {
        simulations: settings.simulations,
        horizon: settings.horizon,
        mean_return: mean(&final_returns),
        std_return: std_dev(&final_returns),
        confidence,
        var95,
        var99,
        expected_shortfall,
        price_bands,
        final_returns,
    })
}

/// Price path of `horizon + 1` points starting at `start`.
fn simulate_path(
    start: f64,
    mu: f64,
    sigma: f64,
    horizon: usize,
    plan: SeedPlan,
    sim: u64,
) -> Vec<f64> {
    let mut path = Vec::with_capacity(horizon + 1);
    let mut price = start;
    path.push(price);
    for step in 0..horizon {
        let simulated_return = seeded_normal(plan.draw(sim, step as u64), mu, sigma);
        price *= 1.0 + simulated_return;
        path.push(price);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<f64> {
        (0..60)
            .map(|i| 100.0 * (1.0 + 0.01 * f64::from(i)) + (f64::from(i) * 0.8).sin() * 4.0)
            .collect()
    }

    const SETTINGS: MonteCarloSettings = MonteCarloSettings {
        simulations: 200,
        horizon: 12,
    };

    #[test]
    fn needs_twenty_prices() {
        let err = run(&[100.0; 19], SETTINGS).unwrap_err();
        assert!(matches!(
            err.current_context(),
            AnalysisError::InsufficientData { .. }
        ));
    }

    #[test]
    fn runs_are_reproducible() {
        let a = run(&history(), SETTINGS).unwrap();
        let b = run(&history(), SETTINGS).unwrap();
        assert_eq!(a.final_returns, b.final_returns);
        assert_eq!(a.var95.to_bits(), b.var95.to_bits());
    }

    #[test]
    fn parallel_paths_match_sequential_evaluation() {
        let prices = history();
        let result = run(&prices, SETTINGS).unwrap();
        let returns = simple_returns(&prices);
        let start = prices[prices.len() - 1];
        let plan = SeedPlan::new(SEED_BASE);
        for sim in [0usize, 17, 199] {
            let path = simulate_path(start, mean(&returns), std_dev(&returns), 12, plan, sim as u64);
            let expected = (path[12] - start) / start * 100.0;
            assert_eq!(result.final_returns[sim].to_bits(), expected.to_bits());
        }
    }

    #[test]
    fn bands_are_monotonic() {
        let result = run(&history(), SETTINGS).unwrap();
        let c = result.confidence;
        assert!(c.p5 <= c.p25 && c.p25 <= c.p75 && c.p75 <= c.p95);
        assert!(result.var99 <= result.var95);
        assert!(result.expected_shortfall <= result.var95);
        assert_eq!(result.price_bands.len(), 12);
        for band in &result.price_bands {
            let b = band.bands;
            assert!(b.p5 <= b.p25 && b.p25 <= band.median && band.median <= b.p75);
            assert!(b.p75 <= b.p95);
        }
    }

    #[test]
    fn constant_history_has_no_spread() {
        let result = run(&[50.0; 30], SETTINGS).unwrap();
        assert!(result.final_returns.iter().all(|r| r.abs() < 1e-12));
        assert!(result.std_return.abs() < 1e-12);
    }
}
