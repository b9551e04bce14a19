//! "Maxwell demon" decomposition of price changes into planned and
//! unexpected parts, plus the stochastic transition and forecast steps that
//! reuse the same information weighting.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::EnergyState;
use crate::stats::{correlation, mean, seeded_normal, std_dev};

/// Added to temperatures and volatilities before they divide a barrier.
const THERMAL_EPSILON: f64 = 0.001;
/// Scales temperature into the Landauer `kT` term.
const BOLTZMANN_SCALE: f64 = 0.001;
/// Residuals at least this many standard deviations wide are "big moves".
const BIG_MOVE_SIGMA: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemonModel {
    /// Efficiency from entropy alone.
    Simple,
    /// Efficiency bounded by Landauer energy accounting and damped by a
    /// Boltzmann factor.
    Rigorous,
}

impl DemonModel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "simple" => Some(Self::Simple),
            "rigorous" => Some(Self::Rigorous),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Decomposition {
    pub planned: Vec<f64>,
    pub unexpected: Vec<f64>,
    pub avg_change: f64,
    pub demon_efficiency: f64,
    pub processing_efficiency: f64,
    pub available_energy: f64,
    pub boltzmann_factor: f64,
}

/// Split using entropy only: `separation = demonEfficiency`.
pub fn decompose_simple(deltas: &[f64], entropy: f64) -> Decomposition {
    let max_entropy = max_entropy(deltas.len());
    let efficiency = demon_efficiency(entropy, max_entropy);
    split(deltas, efficiency, 1.0, 1.0, 0.0)
}

/// Split with Landauer-style energy accounting.
///
/// Processing costs `temperature * 0.001 * ln 2` per bit; the demon can spend
/// `barrier * demonEfficiency`. The separation is further damped by
/// `exp(-barrier / (temperature + 0.001))`.
pub fn decompose_rigorous(
    deltas: &[f64],
    entropy: f64,
    temperature: f64,
    energy_barrier: f64,
) -> Decomposition {
    let min_energy_per_bit = temperature * BOLTZMANN_SCALE * std::f64::consts::LN_2;
    let max_entropy = max_entropy(deltas.len());
    let efficiency = demon_efficiency(entropy, max_entropy);

    let available_energy = energy_barrier * efficiency;
    let processing_efficiency = if available_energy > min_energy_per_bit {
        (1.0 - min_energy_per_bit / available_energy).min(1.0)
    } else {
        0.0
    };
    let boltzmann = (-energy_barrier / (temperature + THERMAL_EPSILON)).exp();

    split(
        deltas,
        efficiency,
        processing_efficiency,
        boltzmann,
        available_energy,
    )
}

fn split(
    deltas: &[f64],
    efficiency: f64,
    processing_efficiency: f64,
    boltzmann: f64,
    available_energy: f64,
) -> Decomposition {
    let changes = deltas.get(1..).unwrap_or_default();
    let avg_change = mean(changes);
    let spread = std_dev(changes);
    let separation = efficiency * processing_efficiency * boltzmann;

    let mut planned = Vec::with_capacity(deltas.len());
    let mut unexpected = Vec::with_capacity(deltas.len());
    for (i, &change) in deltas.iter().enumerate() {
        if i == 0 {
            planned.push(0.0);
            unexpected.push(0.0);
            continue;
        }
        let residual = change - avg_change;
        let typicality = if spread > 0.0 {
            (-residual.abs() / (2.0 * spread * spread)).exp()
        } else {
            1.0
        };
        let planned_part = avg_change * (1.0 + separation * typicality);
        planned.push(planned_part);
        unexpected.push(change - planned_part);
    }

    Decomposition {
        planned,
        unexpected,
        avg_change,
        demon_efficiency: efficiency,
        processing_efficiency,
        available_energy,
        boltzmann_factor: boltzmann,
    }
}

fn max_entropy(len: usize) -> f64 {
    if len < 2 {
        return 0.0;
    }
    (len as f64).log2()
}

fn demon_efficiency(entropy: f64, max_entropy: f64) -> f64 {
    if max_entropy <= 0.0 {
        return 0.0;
    }
    (1.0 - entropy / max_entropy).clamp(0.0, 1.0)
}

/// `0.7 * demonEfficiency * processingEfficiency + 0.3 * normalized
/// information gain`.
pub fn combined_efficiency(decomposition: &Decomposition, entropy: f64) -> f64 {
    let max_entropy = max_entropy(decomposition.planned.len());
    let normalized_gain = if max_entropy > 0.0 {
        (max_entropy - entropy).max(0.0) / max_entropy
    } else {
        0.0
    };
    let combined = decomposition.demon_efficiency * decomposition.processing_efficiency;
    combined * 0.7 + normalized_gain * 0.3
}

/// Lag-1 correlation magnitude of the unexpected series scaled by the
/// remaining entropy headroom `1 - H / log2(N)` (floored at zero).
pub fn information_flow(unexpected: &[f64], entropy: f64) -> f64 {
    if unexpected.len() < 3 {
        return 0.0;
    }
    let x = &unexpected[..unexpected.len() - 1];
    let y = &unexpected[1..];
    let corr = correlation(x, y);
    let headroom = (1.0 - entropy / (unexpected.len() as f64).log2()).max(0.0);
    corr.abs() * headroom
}

/// Stochastic step used to replay a historical path.
pub fn transition(
    state: &EnergyState,
    planned_change: f64,
    volatility: f64,
    information_flow: f64,
    seed: f64,
    energy_barrier_factor: f64,
) -> f64 {
    let draw = seeded_normal(seed, 0.0, volatility);
    let preference = if information_flow > 0.0 {
        sign(planned_change) * draw.abs() * information_flow
    } else {
        draw
    };
    let barrier = state.energy.abs() * energy_barrier_factor;
    let barrier_effect = (-barrier / (volatility + THERMAL_EPSILON)).exp();
    planned_change + preference * barrier_effect
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Optimistic,
    Base,
    Pessimistic,
}

/// Demon-adjusted inputs shared by the three scenarios of a forecast step.
#[derive(Debug, Clone, Copy)]
pub struct ForecastStep {
    pub base_change: f64,
    pub information_flow: f64,
    pub temperature: f64,
    pub demon_efficiency: f64,
    pub energy_barrier_factor: f64,
    pub seed: f64,
}

impl ForecastStep {
    /// Projected change for one scenario.
    ///
    /// All scenarios of a step must share `seed` so they are correlated
    /// draws from the same underlying path. A zero `volatility_bias` falls
    /// back to the temperature as the spread.
    pub fn change(&self, state: &EnergyState, volatility_bias: f64, scenario: Scenario) -> f64 {
        let spread = if volatility_bias != 0.0 && volatility_bias.is_finite() {
            volatility_bias.abs()
        } else {
            self.temperature
        };
        let draw = seeded_normal(self.seed, 0.0, spread);
        let random = match scenario {
            Scenario::Optimistic => draw.abs(),
            Scenario::Pessimistic => -draw.abs(),
            Scenario::Base => draw,
        };

        let demon_adjustment =
            self.information_flow * self.demon_efficiency * sign(self.base_change) * random.abs();
        let barrier = state.energy.abs() * self.energy_barrier_factor;
        let boltzmann = (-barrier / (self.temperature + THERMAL_EPSILON)).exp();

        self.base_change + (random + demon_adjustment) * boltzmann
    }
}

/// `det[i] = det[i-1] + planned[i] + unexpected[i]`, starting at `prices[0]`.
pub fn reconstruct_deterministic(prices: &[f64], decomposition: &Decomposition) -> Vec<f64> {
    let Some(&start) = prices.first() else {
        return Vec::new();
    };
    let mut path = Vec::with_capacity(prices.len());
    path.push(start);
    for i in 1..prices.len() {
        let next = path[i - 1] + decomposition.planned[i] + decomposition.unexpected[i];
        path.push(next);
    }
    path
}

/// Replays history through [`transition`], seeding step `i` with `seeds(i)`.
///
/// The energy state starts from the last historical state and then tracks the
/// simulated price.
pub fn reconstruct_stochastic(
    prices: &[f64],
    decomposition: &Decomposition,
    information_flow: f64,
    energy_barrier_factor: f64,
    seeds: impl Fn(u64) -> f64,
) -> Vec<f64> {
    let Some(&start) = prices.first() else {
        return Vec::new();
    };
    let volatility = std_dev(decomposition.unexpected.get(1..).unwrap_or_default());
    let mut state = prices
        .last()
        .map(|&p| EnergyState::new(p, start))
        .unwrap_or_else(|| EnergyState::new(start, start));

    let mut path = Vec::with_capacity(prices.len());
    path.push(start);
    for i in 1..prices.len() {
        let step = transition(
            &state,
            decomposition.planned[i],
            volatility,
            information_flow,
            seeds(i as u64),
            energy_barrier_factor,
        );
        let next = path[i - 1] + step;
        path.push(next);
        state = EnergyState::new(next, start);
    }
    path
}

#[derive(Debug, Clone, Serialize)]
pub struct BigMove {
    pub date: NaiveDate,
    pub value: f64,
}

/// Unexpected changes at least 1.5 standard deviations in magnitude.
pub fn big_moves(dates: &[NaiveDate], unexpected: &[f64]) -> Vec<BigMove> {
    let spread = std_dev(unexpected.get(1..).unwrap_or_default());
    if spread == 0.0 {
        return Vec::new();
    }
    let threshold = spread * BIG_MOVE_SIGMA;
    dates
        .iter()
        .zip(unexpected)
        .skip(1)
        .filter(|(_, u)| u.abs() >= threshold)
        .map(|(&date, &value)| BigMove { date, value })
        .collect()
}

/// Sign with `sign(0) == 0`, unlike `f64::signum`.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
