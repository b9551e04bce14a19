use error_stack::Report;
use serde::Serialize;

use crate::error::IndicatorError;
use crate::indicator::IndicatorSet;
use crate::indicator::levels::PricePosition;
use crate::indicator::trend::TrendDirection;
use crate::params::ModelParams;

/// Support/resistance proximity has a fixed weight.
const LEVELS_WEIGHT: f64 = 0.5;
/// Trend contributes only above this strength.
const TREND_STRENGTH_FLOOR: f64 = 50.0;
/// Points forced to HOLD by the historical crossover proxy.
pub const HISTORICAL_WARMUP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalKind {
    #[serde(rename = "STRONG BUY")]
    StrongBuy,
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "STRONG SELL")]
    StrongSell,
}

impl SignalKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG BUY",
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Sell => "SELL",
            Self::StrongSell => "STRONG SELL",
        }
    }

    /// BUY or STRONG BUY.
    pub fn is_buy(self) -> bool {
        matches!(self, Self::Buy | Self::StrongBuy)
    }

    /// SELL or STRONG SELL.
    pub fn is_sell(self) -> bool {
        matches!(self, Self::Sell | Self::StrongSell)
    }
}

/// One indicator's vote.
#[derive(Debug, Clone, Serialize)]
pub struct Contribution {
    pub kind: SignalKind,
    pub source: &'static str,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalSet {
    pub overall: SignalKind,
    /// Signed sum of all contributions.
    pub signal_strength: f64,
    pub contributions: Vec<Contribution>,
}

impl SignalSet {
    /// Magnitude of `signal_strength`.
    pub fn strength(&self) -> f64 {
        self.signal_strength.abs()
    }
}

/// Map a signed strength onto the five-level scale.
pub fn classify(strength: f64, buy_threshold: f64, strong_buy_threshold: f64) -> SignalKind {
    if strength >= strong_buy_threshold {
        SignalKind::StrongBuy
    } else if strength >= buy_threshold {
        SignalKind::Buy
    } else if strength <= -strong_buy_threshold {
        SignalKind::StrongSell
    } else if strength <= -buy_threshold {
        SignalKind::Sell
    } else {
        SignalKind::Hold
    }
}

/// Weighted vote of every indicator with a directional reading.
pub fn generate(indicators: &IndicatorSet, params: &ModelParams) -> SignalSet {
    let mut contributions = Vec::new();
    let mut vote = |kind: SignalKind, source: &'static str, weight: f64| {
        contributions.push(Contribution {
            kind,
            source,
            weight,
        })
    };

    if let Some(rsi) = indicators.rsi {
        if rsi < params.rsi_oversold {
            vote(SignalKind::Buy, "RSI Oversold", params.signal_rsi_weight);
        } else if rsi > params.rsi_overbought {
            vote(SignalKind::Sell, "RSI Overbought", params.signal_rsi_weight);
        }
    }

    if let Some(macd) = indicators.macd {
        if macd.histogram > 0.0 && macd.macd > macd.signal {
            vote(SignalKind::Buy, "MACD Bullish", params.signal_macd_weight);
        } else if macd.histogram < 0.0 && macd.macd < macd.signal {
            vote(SignalKind::Sell, "MACD Bearish", params.signal_macd_weight);
        }
    }

    if let (Some(short), Some(long)) = (indicators.sma_short, indicators.sma_long) {
        let price = indicators.current_price;
        if price > short && short > long {
            vote(SignalKind::Buy, "Golden Cross", params.signal_ma_weight);
        } else if price < short && short < long {
            vote(SignalKind::Sell, "Death Cross", params.signal_ma_weight);
        }
    }

    if let Some(trend) = indicators.trend.filter(|t| t.strength > TREND_STRENGTH_FLOOR) {
        match trend.direction {
            TrendDirection::Bullish => {
                vote(SignalKind::Buy, "Strong Uptrend", params.signal_trend_weight)
            }
            TrendDirection::Bearish => {
                vote(SignalKind::Sell, "Strong Downtrend", params.signal_trend_weight)
            }
            TrendDirection::Neutral => {}
        }
    }

    if let Some(levels) = indicators.levels {
        match levels.position {
            PricePosition::NearSupport => vote(SignalKind::Buy, "Support Level", LEVELS_WEIGHT),
            PricePosition::NearResistance => {
                vote(SignalKind::Sell, "Resistance Level", LEVELS_WEIGHT)
            }
            PricePosition::Middle => {}
        }
    }

    let signal_strength: f64 = contributions
        .iter()
        .map(|c| if c.kind.is_buy() { c.weight } else { -c.weight })
        .sum();
    let overall = classify(
        signal_strength,
        params.signal_buy_threshold,
        params.signal_strong_buy_threshold,
    );

    SignalSet {
        overall,
        signal_strength,
        contributions,
    }
}

/// Per-point proxy signals for the simple backtest.
///
/// Each point's price is compared against the *final* short/long moving
/// averages; the first [`HISTORICAL_WARMUP`] points are HOLD.
pub fn historical_signals(prices: &[f64], indicators: &IndicatorSet) -> Vec<SignalKind> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &price)| {
            if i < HISTORICAL_WARMUP {
                return SignalKind::Hold;
            }
            match (indicators.sma_short, indicators.sma_long) {
                (Some(short), Some(long)) if price > short && short > long => SignalKind::Buy,
                (Some(short), Some(long)) if price < short && short < long => SignalKind::Sell,
                _ => SignalKind::Hold,
            }
        })
        .collect()
}

/// Composite signal at each index of `range`, computed only from the prices
/// up to and including that index.
pub fn expanding_signals(
    prices: &[f64],
    range: std::ops::Range<usize>,
    params: &ModelParams,
) -> Result<Vec<SignalKind>, Report<IndicatorError>> {
    range
        .map(|end| {
            let indicators = IndicatorSet::compute(&prices[..=end], params)?;
            Ok(generate(&indicators, params).overall)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::levels::LevelsReading;
    use crate::indicator::macd::MacdReading;
    use crate::indicator::trend::TrendReading;

    fn empty_set(price: f64) -> IndicatorSet {
        IndicatorSet {
            current_price: price,
            rsi: None,
            macd: None,
            sma_short: None,
            sma_long: None,
            bollinger: None,
            volatility: None,
            trend: None,
            levels: None,
            adx: None,
            stochastic: None,
            williams_r: None,
            obv: None,
            atr: None,
            cci: None,
        }
    }

    #[test]
    fn classification_thresholds() {
        assert_eq!(classify(2.0, 1.0, 2.0), SignalKind::StrongBuy);
        assert_eq!(classify(1.0, 1.0, 2.0), SignalKind::Buy);
        assert_eq!(classify(0.99, 1.0, 2.0), SignalKind::Hold);
        assert_eq!(classify(-1.0, 1.0, 2.0), SignalKind::Sell);
        assert_eq!(classify(-2.5, 1.0, 2.0), SignalKind::StrongSell);
    }

    #[test]
    fn absent_readings_contribute_nothing() {
        let signals = generate(&empty_set(100.0), &ModelParams::default());
        assert_eq!(signals.overall, SignalKind::Hold);
        assert_eq!(signals.signal_strength, 0.0);
        assert!(signals.contributions.is_empty());
    }

    #[test]
    fn bullish_readings_sum_to_strong_buy() {
        let mut set = empty_set(110.0);
        set.rsi = Some(25.0);
        set.macd = Some(MacdReading {
            macd: 2.0,
            signal: 1.0,
            histogram: 1.0,
        });
        set.sma_short = Some(105.0);
        set.sma_long = Some(100.0);
        set.trend = Some(TrendReading {
            strength: 60.0,
            direction: TrendDirection::Bullish,
        });
        set.levels = Some(LevelsReading {
            support: Some(100.0),
            resistance: Some(150.0),
            position: PricePosition::NearSupport,
        });

        let signals = generate(&set, &ModelParams::default());
        // 1 + 1 + 1.5 + 1 + 0.5
        assert!((signals.signal_strength - 5.0).abs() < 1e-9);
        assert_eq!(signals.overall, SignalKind::StrongBuy);
        assert_eq!(signals.contributions.len(), 5);
    }

    #[test]
    fn weak_trend_is_ignored() {
        let mut set = empty_set(90.0);
        set.trend = Some(TrendReading {
            strength: 50.0,
            direction: TrendDirection::Bearish,
        });
        assert!(generate(&set, &ModelParams::default()).contributions.is_empty());
    }

    #[test]
    fn bearish_moving_averages_sell() {
        let mut set = empty_set(90.0);
        set.sma_short = Some(95.0);
        set.sma_long = Some(100.0);
        let signals = generate(&set, &ModelParams::default());
        assert!((signals.signal_strength + 1.5).abs() < 1e-9);
        assert_eq!(signals.overall, SignalKind::Sell);
        assert!((signals.strength() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn historical_signals_warm_up_then_compare_to_final_averages() {
        let prices: Vec<f64> = (0..60).map(|i| if i < 55 { 90.0 } else { 120.0 }).collect();
        let mut set = empty_set(120.0);
        set.sma_short = Some(110.0);
        set.sma_long = Some(100.0);
        let signals = historical_signals(&prices, &set);
        assert_eq!(signals.len(), 60);
        assert!(signals[..50].iter().all(|s| *s == SignalKind::Hold));
        assert!(signals[50..55].iter().all(|s| *s == SignalKind::Hold));
        assert!(signals[55..].iter().all(|s| *s == SignalKind::Buy));
    }

    #[test]
    fn historical_signals_without_averages_hold() {
        let signals = historical_signals(&[100.0; 70], &empty_set(100.0));
        assert!(signals.iter().all(|s| *s == SignalKind::Hold));
    }

    #[test]
    fn expanding_signals_have_one_entry_per_index() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + f64::from(i)).collect();
        let signals = expanding_signals(&prices, 20..30, &ModelParams::default()).unwrap();
        assert_eq!(signals.len(), 10);
    }
}
