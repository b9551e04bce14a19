use error_stack::Report;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, positive};

/// Simple Moving Average.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        positive(period, "period")?;
        Ok(Self { period })
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn name(&self) -> &str {
        "sma"
    }

    fn required_prices(&self) -> usize {
        self.period
    }

    fn latest(&self, prices: &[f64]) -> Option<f64> {
        if prices.len() < self.period {
            return None;
        }
        let window = &prices[prices.len() - self.period..];
        Some(window.iter().sum::<f64>() / self.period as f64)
    }
}

/// Exponential Moving Average.
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        positive(period, "period")?;
        Ok(Self { period })
    }

    /// Full EMA series, one value per price from index `period - 1` on.
    ///
    /// Empty when there are fewer than `period` prices.
    pub fn series(&self, prices: &[f64]) -> Vec<f64> {
        if prices.len() < self.period {
            return Vec::new();
        }

        let k = 2.0 / (self.period as f64 + 1.0);
        // Seed with SMA of first `period` values
        let mut ema = prices[..self.period].iter().sum::<f64>() / self.period as f64;
        let mut results = Vec::with_capacity(prices.len() - self.period + 1);
        results.push(ema);

        for &price in &prices[self.period..] {
            ema += (price - ema) * k;
            results.push(ema);
        }

        results
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn name(&self) -> &str {
        "ema"
    }

    fn required_prices(&self) -> usize {
        self.period
    }

    fn latest(&self, prices: &[f64]) -> Option<f64> {
        self.series(prices).last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_period_zero_invalid() {
        assert!(Sma::new(0).is_err());
    }

    #[test]
    fn sma_insufficient_data() {
        let sma = Sma::new(5).unwrap();
        assert!(sma.latest(&[1.0; 4]).is_none());
    }

    #[test]
    fn sma_uses_trailing_window() {
        let sma = Sma::new(3).unwrap();
        // (2+3+4)/3 = 3.0
        let value = sma.latest(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!((value - 3.0).abs() < 1e-9);
    }

    #[test]
    fn ema_period_zero_invalid() {
        assert!(Ema::new(0).is_err());
    }

    #[test]
    fn ema_insufficient_data() {
        let ema = Ema::new(5).unwrap();
        assert!(ema.series(&[1.0; 4]).is_empty());
        assert!(ema.latest(&[1.0; 4]).is_none());
    }

    #[test]
    fn ema_flat_prices() {
        let ema = Ema::new(3).unwrap();
        for v in ema.series(&[10.0; 6]) {
            assert!((v - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn ema_seed_equals_sma_then_recurs() {
        let ema = Ema::new(3).unwrap();
        let values = ema.series(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(values.len(), 2);
        // seed = (1+2+3)/3 = 2.0, then 2 + (4-2)*0.5 = 3.0
        assert!((values[0] - 2.0).abs() < 1e-9);
        assert!((values[1] - 3.0).abs() < 1e-9);
    }
}
