//! Three-scenario price projection driven by the demon decomposition.

use chrono::NaiveDate;
use serde::Serialize;

use crate::demon::{Decomposition, ForecastStep, Scenario};
use crate::entropy::market_temperature;
use crate::model::{EnergyState, PriceSeries};
use crate::params::ModelParams;
use crate::stats::{SeedPlan, mean, std_dev};

/// Seed path reserved for forecast draws; path 0 replays history.
const FORECAST_SEED_PATH: u64 = 1;
const SCENARIO_BIAS: f64 = 0.5;
const MOMENTUM_LOOKBACK: usize = 3;

/// Projected price paths. Each path starts at the last observed price, so it
/// holds one more point than `dates`.
#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub dates: Vec<NaiveDate>,
    pub base: Vec<f64>,
    pub optimistic: Vec<f64>,
    pub pessimistic: Vec<f64>,
    pub final_price: f64,
    pub momentum: f64,
    pub initial_volatility: f64,
    pub temperature: f64,
    pub demon_efficiency: f64,
}

/// Inputs carried over from the decomposition of the history.
#[derive(Debug, Clone, Copy)]
pub struct ForecastContext<'a> {
    pub decomposition: &'a Decomposition,
    pub information_flow: f64,
    pub params: &'a ModelParams,
    pub seeds: SeedPlan,
}

/// Project `horizon` periods past the end of `series`.
///
/// Returns `None` for a zero horizon.
pub fn project(series: &PriceSeries, ctx: ForecastContext<'_>, horizon: usize) -> Option<Forecast> {
    if horizon == 0 {
        return None;
    }
    let last_date = series.last_date()?;
    let prices = &series.prices;
    let last_price = series.last_price();
    let baseline = prices[0];
    let params = ctx.params;
    let unexpected = &ctx.decomposition.unexpected;

    let long_term_vol = std_dev(unexpected.get(1..).unwrap_or_default());
    let mut volatility = long_term_vol * volatility_ratio(unexpected, params.information_flow_window);
    let initial_volatility = volatility;
    let momentum = momentum(prices) * params.momentum_factor;
    let temperature = market_temperature(unexpected);
    let demon_efficiency = ctx.decomposition.demon_efficiency * params.demon_efficiency_adjust;
    let base_change = ctx.decomposition.avg_change + momentum;

    let mut dates = Vec::with_capacity(horizon);
    let mut base = vec![last_price];
    let mut optimistic = vec![last_price];
    let mut pessimistic = vec![last_price];
    let mut state = EnergyState::new(last_price, baseline);

    for i in 1..=horizon {
        dates.push(series.interval.advance(last_date, i as u32));
        volatility = volatility * params.vol_decay + long_term_vol * (1.0 - params.vol_decay);

        let step = ForecastStep {
            base_change,
            information_flow: ctx.information_flow,
            temperature,
            demon_efficiency,
            energy_barrier_factor: params.energy_barrier_factor,
            seed: ctx.seeds.draw(FORECAST_SEED_PATH, i as u64),
        };
        let bias = volatility * SCENARIO_BIAS;
        extend(&mut optimistic, step.change(&state, bias, Scenario::Optimistic));
        extend(&mut pessimistic, step.change(&state, -bias, Scenario::Pessimistic));
        let next = extend(&mut base, step.change(&state, 0.0, Scenario::Base));

        state = EnergyState::new(next, baseline);
    }

    let final_price = base.last().copied().unwrap_or(last_price);
    tracing::debug!(horizon, final_price, initial_volatility, "forecast projected");

    Some(Forecast {
        dates,
        base,
        optimistic,
        pessimistic,
        final_price,
        momentum,
        initial_volatility,
        temperature,
        demon_efficiency,
    })
}

fn extend(path: &mut Vec<f64>, change: f64) -> f64 {
    let next = path.last().copied().unwrap_or_default() + change;
    path.push(next);
    next
}

/// Recent mean absolute residual relative to the long-run residual spread.
fn volatility_ratio(unexpected: &[f64], window: usize) -> f64 {
    let residuals: Vec<f64> = unexpected.iter().skip(1).map(|u| u.abs()).collect();
    let window = window.min(residuals.len() / 2);
    if window == 0 {
        return 1.0;
    }
    let recent = mean(&residuals[residuals.len() - window..]);
    let long_term = std_dev(unexpected.get(1..).unwrap_or_default());
    if recent == 0.0 || long_term == 0.0 {
        return 1.0;
    }
    recent / long_term
}

/// Average change over the last three periods; `0.0` below three prices.
fn momentum(prices: &[f64]) -> f64 {
    let n = prices.len();
    if n < MOMENTUM_LOOKBACK {
        return 0.0;
    }
    (prices[n - 1] - prices[n - MOMENTUM_LOOKBACK]) / MOMENTUM_LOOKBACK as f64
}
