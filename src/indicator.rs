pub mod bollinger;
pub mod levels;
pub mod ma;
pub mod macd;
pub mod oscillator;
pub mod rsi;
pub mod trend;
pub mod volatility;

use error_stack::{Report, bail};
use serde::Serialize;

use crate::error::IndicatorError;
use crate::params::ModelParams;

use bollinger::{Bands, BollingerBands};
use levels::{LevelsReading, SupportResistance};
use ma::Sma;
use macd::{Macd, MacdReading};
use oscillator::{Cci, Stochastic, StochasticReading, WilliamsR};
use rsi::Rsi;
use trend::{Adx, AdxReading, TrendReading, TrendStrength, VolatilityReading, VolatilityRegime};
use volatility::{Atr, Obv};

/// A technical indicator evaluated at the last point of a price history.
///
/// Prices must be in ascending chronological order (oldest first).
pub trait Indicator {
    type Output;

    /// Unique name of this indicator (e.g., "rsi", "sma").
    fn name(&self) -> &str;

    /// Minimum number of prices required to produce a reading.
    fn required_prices(&self) -> usize;

    /// Reading at the most recent price, or `None` when the history is too
    /// short or the reading is undefined (e.g. a zero range).
    fn latest(&self, prices: &[f64]) -> Option<Self::Output>;
}

/// Evaluate `indicator` and log when it has nothing to say.
fn reading<I: Indicator>(indicator: &I, prices: &[f64]) -> Option<I::Output> {
    let value = indicator.latest(prices);
    if value.is_none() {
        tracing::debug!(
            indicator = indicator.name(),
            required = indicator.required_prices(),
            available = prices.len(),
            "no reading for indicator"
        );
    }
    value
}

/// Reject a zero window length.
fn positive(value: usize, name: &str) -> Result<usize, Report<IndicatorError>> {
    if value == 0 {
        bail!(IndicatorError::InvalidParameter {
            name: format!("{name} must be > 0"),
        });
    }
    Ok(value)
}

const MACD_SIGNAL_PERIOD: usize = 9;
const BOLLINGER_PERIOD: usize = 20;
const BOLLINGER_WIDTH: f64 = 2.0;
const TREND_PERIOD: usize = 20;
const LEVELS_LOOKBACK: usize = 50;
const ADX_PERIOD: usize = 14;
const OSCILLATOR_PERIOD: usize = 14;
const STOCHASTIC_SMOOTHING: usize = 3;
const CCI_PERIOD: usize = 20;

/// Every indicator reading of one price history.
///
/// Absent readings mean "insufficient history" and carry no signal.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSet {
    pub current_price: f64,
    pub rsi: Option<f64>,
    pub macd: Option<MacdReading>,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub bollinger: Option<Bands>,
    pub volatility: Option<VolatilityReading>,
    pub trend: Option<TrendReading>,
    pub levels: Option<LevelsReading>,
    pub adx: Option<AdxReading>,
    pub stochastic: Option<StochasticReading>,
    pub williams_r: Option<f64>,
    pub obv: Option<f64>,
    pub atr: Option<f64>,
    pub cci: Option<f64>,
}

impl IndicatorSet {
    pub fn compute(prices: &[f64], params: &ModelParams) -> Result<Self, Report<IndicatorError>> {
        Ok(Self {
            current_price: prices.last().copied().unwrap_or_default(),
            rsi: reading(&Rsi::new(params.rsi_period)?, prices),
            macd: reading(
                &Macd::new(params.macd_fast, params.macd_slow, MACD_SIGNAL_PERIOD)?,
                prices,
            ),
            sma_short: reading(&Sma::new(params.sma_short_period)?, prices),
            sma_long: reading(&Sma::new(params.sma_long_period)?, prices),
            bollinger: reading(&BollingerBands::new(BOLLINGER_PERIOD, BOLLINGER_WIDTH)?, prices),
            volatility: reading(&VolatilityRegime::default(), prices),
            trend: reading(&TrendStrength::new(TREND_PERIOD)?, prices),
            levels: reading(&SupportResistance::new(LEVELS_LOOKBACK)?, prices),
            adx: reading(&Adx::new(ADX_PERIOD)?, prices),
            stochastic: reading(
                &Stochastic::new(OSCILLATOR_PERIOD, STOCHASTIC_SMOOTHING)?,
                prices,
            ),
            williams_r: reading(&WilliamsR::new(OSCILLATOR_PERIOD)?, prices),
            obv: reading(&Obv, prices),
            atr: reading(&Atr::new(OSCILLATOR_PERIOD)?, prices),
            cci: reading(&Cci::new(CCI_PERIOD)?, prices),
        })
    }
}

/// Lowest and highest value of a non-empty window.
pub(crate) fn window_range(window: &[f64]) -> (f64, f64) {
    window
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Local maxima and minima by strict three-point comparison, as
/// `(index, value)` pairs.
pub(crate) fn turning_points(prices: &[f64]) -> (Vec<(usize, f64)>, Vec<(usize, f64)>) {
    let mut highs = Vec::new();
    let mut lows = Vec::new();
    for (i, w) in prices.windows(3).enumerate() {
        if w[1] > w[0] && w[1] > w[2] {
            highs.push((i + 1, w[1]));
        }
        if w[1] < w[0] && w[1] < w[2] {
            lows.push((i + 1, w[1]));
        }
    }
    (highs, lows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + i as f64 + (i as f64 * 0.9).sin() * 3.0)
            .collect()
    }

    #[test]
    fn short_history_leaves_readings_absent() {
        let prices = trending(10);
        let set = IndicatorSet::compute(&prices, &ModelParams::default()).unwrap();
        assert!(set.rsi.is_none());
        assert!(set.macd.is_none());
        assert!(set.sma_short.is_none());
        assert!(set.sma_long.is_none());
        assert!(set.trend.is_none());
        assert!(set.volatility.is_none());
        assert!(set.levels.is_some());
        assert!(set.obv.is_some());
        assert_eq!(set.current_price, prices[9]);
    }

    #[test]
    fn long_history_fills_every_reading() {
        let prices = trending(120);
        let set = IndicatorSet::compute(&prices, &ModelParams::default()).unwrap();
        assert!(set.rsi.is_some());
        assert!(set.macd.is_some());
        assert!(set.sma_short.is_some());
        assert!(set.sma_long.is_some());
        assert!(set.bollinger.is_some());
        assert!(set.volatility.is_some());
        assert!(set.trend.is_some());
        assert!(set.adx.is_some());
        assert!(set.stochastic.is_some());
        assert!(set.williams_r.is_some());
        assert!(set.atr.is_some());
        assert!(set.cci.is_some());
    }

    #[test]
    fn turning_points_use_strict_comparison() {
        let (highs, lows) = turning_points(&[1.0, 3.0, 2.0, 2.0, 1.0, 4.0]);
        assert_eq!(highs, vec![(1, 3.0)]);
        assert_eq!(lows, vec![(4, 1.0)]);
    }
}
