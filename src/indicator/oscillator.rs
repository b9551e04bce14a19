//! Range-bound oscillators: stochastic %K, Williams %R and CCI.

use error_stack::Report;
use serde::Serialize;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, positive, window_range};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StochasticReading {
    pub k: f64,
    /// Unsmoothed; always equal to `k`.
    pub d: f64,
}

pub struct Stochastic {
    period: usize,
    smoothing: usize,
}

impl Stochastic {
    pub fn new(period: usize, smoothing: usize) -> Result<Self, Report<IndicatorError>> {
        positive(period, "period")?;
        Ok(Self { period, smoothing })
    }
}

impl Indicator for Stochastic {
    type Output = StochasticReading;

    fn name(&self) -> &str {
        "stochastic"
    }

    fn required_prices(&self) -> usize {
        self.period + self.smoothing
    }

    fn latest(&self, prices: &[f64]) -> Option<StochasticReading> {
        if prices.len() < self.required_prices() {
            return None;
        }
        let current = *prices.last()?;
        let (lowest, highest) = window_range(&prices[prices.len() - self.period..]);
        let range = highest - lowest;
        if range == 0.0 {
            return None;
        }
        let k = (current - lowest) / range * 100.0;
        Some(StochasticReading { k, d: k })
    }
}

pub struct WilliamsR {
    period: usize,
}

impl WilliamsR {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        positive(period, "period")?;
        Ok(Self { period })
    }
}

impl Indicator for WilliamsR {
    type Output = f64;

    fn name(&self) -> &str {
        "williams_r"
    }

    fn required_prices(&self) -> usize {
        self.period
    }

    fn latest(&self, prices: &[f64]) -> Option<f64> {
        if prices.len() < self.period {
            return None;
        }
        let current = *prices.last()?;
        let (lowest, highest) = window_range(&prices[prices.len() - self.period..]);
        let range = highest - lowest;
        if range == 0.0 {
            return None;
        }
        Some((highest - current) / range * -100.0)
    }
}

/// Commodity Channel Index on closes.
pub struct Cci {
    period: usize,
}

impl Cci {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        positive(period, "period")?;
        Ok(Self { period })
    }
}

impl Indicator for Cci {
    type Output = f64;

    fn name(&self) -> &str {
        "cci"
    }

    fn required_prices(&self) -> usize {
        self.period
    }

    fn latest(&self, prices: &[f64]) -> Option<f64> {
        if prices.len() < self.period {
            return None;
        }
        let recent = &prices[prices.len() - self.period..];
        let sma = recent.iter().sum::<f64>() / self.period as f64;
        let mean_deviation =
            recent.iter().map(|p| (p - sma).abs()).sum::<f64>() / self.period as f64;
        if mean_deviation == 0.0 {
            return None;
        }
        let current = *prices.last()?;
        Some((current - sma) / (0.015 * mean_deviation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stochastic_needs_period_plus_smoothing() {
        let stoch = Stochastic::new(3, 3).unwrap();
        assert!(stoch.latest(&[1.0, 2.0, 3.0, 4.0, 5.0]).is_none());
        assert!(stoch.latest(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).is_some());
    }

    #[test]
    fn stochastic_at_high_is_100() {
        let stoch = Stochastic::new(3, 3).unwrap();
        let reading = stoch.latest(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert!((reading.k - 100.0).abs() < 1e-9);
        assert_eq!(reading.k, reading.d);
    }

    #[test]
    fn stochastic_zero_range_has_no_reading() {
        let stoch = Stochastic::new(3, 3).unwrap();
        assert!(stoch.latest(&[1.0, 2.0, 3.0, 7.0, 7.0, 7.0]).is_none());
    }

    #[test]
    fn williams_r_known_value() {
        let wr = WilliamsR::new(3).unwrap();
        // high 20, low 10, current 15
        let value = wr.latest(&[10.0, 20.0, 15.0]).unwrap();
        assert!((value + 50.0).abs() < 1e-9);
    }

    #[test]
    fn williams_r_zero_range_has_no_reading() {
        assert!(WilliamsR::new(2).unwrap().latest(&[4.0, 4.0]).is_none());
    }

    #[test]
    fn cci_known_value() {
        let cci = Cci::new(3).unwrap();
        // sma 2, mean deviation 2/3, current 3
        let value = cci.latest(&[1.0, 2.0, 3.0]).unwrap();
        assert!((value - 1.0 / (0.015 * (2.0 / 3.0))).abs() < 1e-9);
    }

    #[test]
    fn cci_flat_has_no_reading() {
        assert!(Cci::new(3).unwrap().latest(&[5.0; 4]).is_none());
    }
}
