//! Trend direction and strength, volatility regime and a single-period ADX.

use error_stack::Report;
use serde::Serialize;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, positive};
use crate::indicator::ma::Sma;
use crate::indicator::volatility::Atr;
use crate::stats::mean;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendReading {
    /// 0..=100
    pub strength: f64,
    pub direction: TrendDirection,
}

/// Direction from price vs. SMA(period) vs. SMA(2 * period); strength from
/// the mean absolute change of the last `period` prices relative to their
/// mean, scaled by 1000 and capped at 100.
pub struct TrendStrength {
    period: usize,
    short: Sma,
    long: Sma,
}

impl TrendStrength {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        positive(period, "period")?;
        Ok(Self {
            period,
            short: Sma::new(period)?,
            long: Sma::new(period * 2)?,
        })
    }
}

impl Indicator for TrendStrength {
    type Output = TrendReading;

    fn name(&self) -> &str {
        "trend"
    }

    fn required_prices(&self) -> usize {
        self.period * 2
    }

    fn latest(&self, prices: &[f64]) -> Option<TrendReading> {
        if prices.len() < self.required_prices() {
            return None;
        }
        let short = self.short.latest(prices)?;
        let long = self.long.latest(prices)?;
        let current = *prices.last()?;

        let direction = if current > short && short > long {
            TrendDirection::Bullish
        } else if current < short && short < long {
            TrendDirection::Bearish
        } else {
            TrendDirection::Neutral
        };

        // the first point of the window contributes a zero change
        let window = &prices[prices.len() - self.period - 1..];
        let moved: f64 = window.windows(2).skip(1).map(|w| (w[1] - w[0]).abs()).sum();
        let avg_change = moved / self.period as f64;
        let strength = if short > 0.0 {
            (avg_change / short * 100.0 * 10.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        Some(TrendReading {
            strength,
            direction,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegimeKind {
    High,
    Normal,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolatilityReading {
    pub regime: RegimeKind,
    /// Recent mean absolute return, in percent.
    pub level: f64,
}

/// Compares the mean absolute return of the last `recent` periods with the
/// whole history.
pub struct VolatilityRegime {
    recent: usize,
    min_prices: usize,
}

impl Default for VolatilityRegime {
    fn default() -> Self {
        Self {
            recent: 10,
            min_prices: 20,
        }
    }
}

impl Indicator for VolatilityRegime {
    type Output = VolatilityReading;

    fn name(&self) -> &str {
        "volatility_regime"
    }

    fn required_prices(&self) -> usize {
        self.min_prices
    }

    fn latest(&self, prices: &[f64]) -> Option<VolatilityReading> {
        if prices.len() < self.min_prices {
            return None;
        }
        let abs_returns: Vec<f64> = prices
            .windows(2)
            .map(|w| ((w[1] - w[0]) / w[0]).abs())
            .collect();
        let recent = &abs_returns[abs_returns.len() - self.recent..];
        let short_vol = recent.iter().sum::<f64>() / self.recent as f64;
        let long_vol = mean(&abs_returns);

        let regime = if long_vol > 0.0 {
            let ratio = short_vol / long_vol;
            if ratio > 1.5 {
                RegimeKind::High
            } else if ratio < 0.7 {
                RegimeKind::Low
            } else {
                RegimeKind::Normal
            }
        } else {
            RegimeKind::Normal
        };

        Some(VolatilityReading {
            regime,
            level: short_vol * 100.0,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdxReading {
    pub adx: f64,
    pub di_plus: f64,
    pub di_minus: f64,
}

/// Single-period DX from averaged directional movement over `period`,
/// reported as ADX without Wilder smoothing.
pub struct Adx {
    period: usize,
    atr: Atr,
}

impl Adx {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        positive(period, "period")?;
        Ok(Self {
            period,
            atr: Atr::new(period)?,
        })
    }
}

impl Indicator for Adx {
    type Output = AdxReading;

    fn name(&self) -> &str {
        "adx"
    }

    fn required_prices(&self) -> usize {
        (self.period * 2).max(self.atr.required_prices())
    }

    fn latest(&self, prices: &[f64]) -> Option<AdxReading> {
        if prices.len() < self.required_prices() {
            return None;
        }
        let atr = self.atr.latest(prices).filter(|&a| a > 0.0)?;

        let recent = &prices[prices.len() - self.period - 1..];
        let (plus_dm, minus_dm) = recent.windows(2).fold((0.0, 0.0), |(plus, minus), w| {
            let up = w[1] - w[0];
            let down = w[0] - w[1];
            let plus = if up > down && up > 0.0 { plus + up } else { plus };
            let minus = if down > up && down > 0.0 { minus + down } else { minus };
            (plus, minus)
        });

        let di_plus = plus_dm / self.period as f64 / atr * 100.0;
        let di_minus = minus_dm / self.period as f64 / atr * 100.0;
        let di_sum = di_plus + di_minus;
        if di_sum == 0.0 {
            return None;
        }

        Some(AdxReading {
            adx: (di_plus - di_minus).abs() / di_sum * 100.0,
            di_plus,
            di_minus,
        })
    }
}
