use error_stack::{Report, bail};
use serde::Serialize;

use crate::error::IndicatorError;
use crate::indicator::{Indicator, positive};
use crate::indicator::ma::Sma;
use crate::stats::std_dev;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

pub struct BollingerBands {
    sma: Sma,
    period: usize,
    std_dev_multiplier: f64,
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Result<Self, Report<IndicatorError>> {
        positive(period, "period")?;
        if std_dev_multiplier <= 0.0 {
            bail!(IndicatorError::InvalidParameter {
                name: "std_dev_multiplier must be > 0".into(),
            });
        }
        Ok(Self {
            sma: Sma::new(period)?,
            period,
            std_dev_multiplier,
        })
    }
}

impl Indicator for BollingerBands {
    type Output = Bands;

    fn name(&self) -> &str {
        "bollinger"
    }

    fn required_prices(&self) -> usize {
        self.period
    }

    fn latest(&self, prices: &[f64]) -> Option<Bands> {
        let middle = self.sma.latest(prices)?;
        let width = self.std_dev_multiplier * std_dev(&prices[prices.len() - self.period..]);
        Some(Bands {
            upper: middle + width,
            middle,
            lower: middle - width,
        })
    }
}
