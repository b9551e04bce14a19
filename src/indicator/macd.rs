use error_stack::Report;
use serde::Serialize;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, positive};
use crate::indicator::ma::Ema;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdReading {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD over the last `signal_period` aligned points of the fast and slow
/// EMAs.
///
/// The signal EMA is seeded from exactly `signal_period` MACD values, so it
/// equals their mean.
pub struct Macd {
    fast: Ema,
    slow: Ema,
    slow_period: usize,
    longest_period: usize,
    signal_period: usize,
}

impl Macd {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    ) -> Result<Self, Report<IndicatorError>> {
        positive(signal_period, "signal_period")?;
        Ok(Self {
            fast: Ema::new(fast_period)?,
            slow: Ema::new(slow_period)?,
            slow_period,
            longest_period: fast_period.max(slow_period),
            signal_period,
        })
    }
}

impl Indicator for Macd {
    type Output = MacdReading;

    fn name(&self) -> &str {
        "macd"
    }

    fn required_prices(&self) -> usize {
        self.longest_period + self.signal_period - 1
    }

    fn latest(&self, prices: &[f64]) -> Option<MacdReading> {
        if prices.len() < self.slow_period {
            return None;
        }
        let fast = self.fast.series(prices);
        let slow = self.slow.series(prices);
        let n = self.signal_period;
        if fast.len() < n || slow.len() < n {
            return None;
        }

        let macd_line: Vec<f64> = fast[fast.len() - n..]
            .iter()
            .zip(&slow[slow.len() - n..])
            .map(|(f, s)| f - s)
            .collect();
        let signal_line = Ema::new(n).ok()?.series(&macd_line);

        let macd = *macd_line.last()?;
        let signal = *signal_line.last()?;
        Some(MacdReading {
            macd,
            signal,
            histogram: macd - signal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macd_zero_period_invalid() {
        assert!(Macd::new(0, 26, 9).is_err());
        assert!(Macd::new(12, 26, 0).is_err());
    }

    #[test]
    fn macd_insufficient_data() {
        let macd = Macd::new(12, 26, 9).unwrap();
        assert!(macd.latest(&[1.0; 33]).is_none());
        assert!(macd.latest(&[1.0; 34]).is_some());
    }

    #[test]
    fn macd_flat_prices_are_zero() {
        let macd = Macd::new(3, 6, 3).unwrap();
        let reading = macd.latest(&[50.0; 20]).unwrap();
        assert!(reading.macd.abs() < 1e-9);
        assert!(reading.signal.abs() < 1e-9);
        assert!(reading.histogram.abs() < 1e-9);
    }

    #[test]
    fn macd_rising_prices_have_positive_line() {
        let macd = Macd::new(3, 6, 3).unwrap();
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + f64::from(i) * 2.0).collect();
        let reading = macd.latest(&prices).unwrap();
        assert!(reading.macd > 0.0);
        assert!((reading.histogram - (reading.macd - reading.signal)).abs() < 1e-12);
    }

    #[test]
    fn macd_accelerating_rise_has_positive_histogram() {
        let macd = Macd::new(3, 6, 3).unwrap();
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + f64::from(i * i) * 0.1).collect();
        let reading = macd.latest(&prices).unwrap();
        assert!(reading.histogram > 0.0);
    }
}
