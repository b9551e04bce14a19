use error_stack::Report;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, positive};

/// Average true range approximated by the mean absolute close-to-close move.
pub struct Atr {
    period: usize,
}

impl Atr {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        positive(period, "period")?;
        Ok(Self { period })
    }
}

impl Indicator for Atr {
    type Output = f64;

    fn name(&self) -> &str {
        "atr"
    }

    fn required_prices(&self) -> usize {
        self.period + 1
    }

    fn latest(&self, prices: &[f64]) -> Option<f64> {
        if prices.len() < self.required_prices() {
            return None;
        }
        let recent = &prices[prices.len() - self.period - 1..];
        let total: f64 = recent.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
        Some(total / self.period as f64)
    }
}

/// On-balance "volume" without volume: the running sum of signed moves.
pub struct Obv;

impl Indicator for Obv {
    type Output = f64;

    fn name(&self) -> &str {
        "obv"
    }

    fn required_prices(&self) -> usize {
        2
    }

    fn latest(&self, prices: &[f64]) -> Option<f64> {
        if prices.len() < self.required_prices() {
            return None;
        }
        Some(prices.windows(2).map(|w| w[1] - w[0]).sum())
    }
}
