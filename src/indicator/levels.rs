use error_stack::Report;
use serde::Serialize;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, positive, turning_points};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PricePosition {
    NearSupport,
    NearResistance,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelsReading {
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    pub position: PricePosition,
}

/// Support and resistance from local extrema of the trailing `lookback`
/// prices (or the whole history when shorter).
pub struct SupportResistance {
    lookback: usize,
}

impl SupportResistance {
    pub fn new(lookback: usize) -> Result<Self, Report<IndicatorError>> {
        positive(lookback, "lookback")?;
        Ok(Self { lookback })
    }
}

impl Indicator for SupportResistance {
    type Output = LevelsReading;

    fn name(&self) -> &str {
        "support_resistance"
    }

    fn required_prices(&self) -> usize {
        1
    }

    fn latest(&self, prices: &[f64]) -> Option<LevelsReading> {
        let current = *prices.last()?;
        let recent = &prices[prices.len().saturating_sub(self.lookback)..];
        let (highs, lows) = turning_points(recent);

        let resistance = highs.iter().map(|&(_, v)| v).reduce(f64::max);
        let support = lows.iter().map(|&(_, v)| v).reduce(f64::min);

        let position = match (support, resistance) {
            (Some(support), Some(resistance)) if resistance > support => {
                let placement = (current - support) / (resistance - support) * 100.0;
                if placement > 75.0 {
                    PricePosition::NearResistance
                } else if placement < 25.0 {
                    PricePosition::NearSupport
                } else {
                    PricePosition::Middle
                }
            }
            _ => PricePosition::Middle,
        };

        Some(LevelsReading {
            support,
            resistance,
            position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_from_local_extrema() {
        let levels = SupportResistance::new(50).unwrap();
        let reading = levels
            .latest(&[10.0, 12.0, 9.0, 14.0, 8.0, 11.0])
            .unwrap();
        assert_eq!(reading.resistance, Some(14.0));
        assert_eq!(reading.support, Some(8.0));
        // (11 - 8) / 6 = 50%
        assert_eq!(reading.position, PricePosition::Middle);
    }

    #[test]
    fn price_near_support() {
        let levels = SupportResistance::new(50).unwrap();
        let reading = levels.latest(&[10.0, 12.0, 9.0, 14.0, 8.0, 8.5]).unwrap();
        assert_eq!(reading.position, PricePosition::NearSupport);
    }

    #[test]
    fn price_near_resistance() {
        let levels = SupportResistance::new(50).unwrap();
        let reading = levels.latest(&[10.0, 12.0, 9.0, 14.0, 8.0, 13.9]).unwrap();
        assert_eq!(reading.position, PricePosition::NearResistance);
    }

    #[test]
    fn lookback_limits_window() {
        let levels = SupportResistance::new(4).unwrap();
        // the early peak at 50 is outside the window
        let reading = levels.latest(&[1.0, 50.0, 1.0, 5.0, 6.0, 4.0, 7.0]).unwrap();
        assert_eq!(reading.resistance, Some(6.0));
        assert_eq!(reading.support, Some(4.0));
    }

    #[test]
    fn monotonic_series_has_no_levels() {
        let levels = SupportResistance::new(50).unwrap();
        let reading = levels.latest(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(reading.support, None);
        assert_eq!(reading.resistance, None);
        assert_eq!(reading.position, PricePosition::Middle);
        assert!(levels.latest(&[]).is_none());
    }
}
