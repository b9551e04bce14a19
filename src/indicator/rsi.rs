use error_stack::Report;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, positive};

/// RSI (Relative Strength Index) from plain averages of the last `period`
/// gains and losses.
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        positive(period, "period")?;
        Ok(Self { period })
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn name(&self) -> &str {
        "rsi"
    }

    fn required_prices(&self) -> usize {
        self.period + 1
    }

    fn latest(&self, prices: &[f64]) -> Option<f64> {
        if prices.len() < self.required_prices() {
            return None;
        }

        let recent = &prices[prices.len() - self.period - 1..];
        let (gains, losses) = recent
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold((0.0, 0.0), |(g, l), d| (g + d.max(0.0), l + (-d).max(0.0)));

        let avg_gain = gains / self.period as f64;
        let avg_loss = losses / self.period as f64;
        Some(rsi_value(avg_gain, avg_loss))
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_insufficient_data() {
        let rsi = Rsi::new(14).unwrap();
        assert!(rsi.latest(&[1.0; 14]).is_none());
    }

    #[test]
    fn rsi_period_zero_invalid() {
        assert!(Rsi::new(0).is_err());
    }

    #[test]
    fn rsi_all_gains_returns_100() {
        let rsi = Rsi::new(2).unwrap();
        assert_eq!(rsi.latest(&[10.0, 11.0, 12.0, 13.0]), Some(100.0));
    }

    #[test]
    fn rsi_all_losses_returns_0() {
        let rsi = Rsi::new(3).unwrap();
        let value = rsi.latest(&[4.0, 3.0, 2.0, 1.0]).unwrap();
        assert!(value.abs() < 1e-9);
    }

    #[test]
    fn rsi_only_looks_at_last_period_changes() {
        let rsi = Rsi::new(2).unwrap();
        // early crash is outside the window: changes +1, -1
        let value = rsi.latest(&[100.0, 10.0, 11.0, 10.0]).unwrap();
        assert!((value - 50.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_stays_in_bounds() {
        let rsi = Rsi::new(5).unwrap();
        let prices: Vec<f64> = (0..40).map(|i| 50.0 + (f64::from(i) * 1.3).sin() * 7.0).collect();
        for end in 6..=prices.len() {
            let value = rsi.latest(&prices[..end]).unwrap();
            assert!((0.0..=100.0).contains(&value));
        }
    }
}
