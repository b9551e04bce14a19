use std::fmt;

use chrono::{Days, Months, NaiveDate};
use error_stack::{Report, bail};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Sampling interval of a price series.
///
/// String representations match the config file format (e.g. `"1d"`, `"1mo"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "1wk")]
    Week1,
    #[serde(rename = "1mo")]
    Month1,
}

impl Interval {
    /// Parse a config-format string into an `Interval`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1d" => Some(Self::Day1),
            "1wk" => Some(Self::Week1),
            "1mo" => Some(Self::Month1),
            _ => None,
        }
    }

    /// Return the config-format string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day1 => "1d",
            Self::Week1 => "1wk",
            Self::Month1 => "1mo",
        }
    }

    /// Date that lies `steps` intervals after `from`.
    ///
    /// Saturates at `from` if the calendar arithmetic overflows.
    pub fn advance(self, from: NaiveDate, steps: u32) -> NaiveDate {
        let next = match self {
            Self::Day1 => from.checked_add_days(Days::new(u64::from(steps))),
            Self::Week1 => from.checked_add_days(Days::new(u64::from(steps) * 7)),
            Self::Month1 => from.checked_add_months(Months::new(steps)),
        };
        next.unwrap_or(from)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single dated closing price as delivered by a price source.
///
/// Sources may report a missing close as `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub close: Option<f64>,
}

/// Validated, ascending price series under analysis.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub dates: Vec<NaiveDate>,
    pub prices: Vec<f64>,
    pub interval: Interval,
}

impl PriceSeries {
    /// Build a series from raw observations, dropping points whose close is
    /// missing or not a finite positive number.
    ///
    /// Ordering is kept as delivered; duplicates are not removed.
    pub fn from_observations(
        observations: &[Observation],
        interval: Interval,
    ) -> Result<Self, Report<AnalysisError>> {
        let (dates, prices): (Vec<NaiveDate>, Vec<f64>) = observations
            .iter()
            .filter_map(|o| {
                o.close
                    .filter(|close| close.is_finite() && *close > 0.0)
                    .map(|close| (o.date, close))
            })
            .unzip();

        if prices.len() < 2 {
            bail!(AnalysisError::InsufficientData {
                required: 2,
                available: prices.len(),
            });
        }

        let dropped = observations.len() - prices.len();
        if dropped > 0 {
            tracing::debug!(dropped, kept = prices.len(), "dropped invalid observations");
        }

        Ok(Self {
            dates,
            prices,
            interval,
        })
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn last_price(&self) -> f64 {
        self.prices.last().copied().unwrap_or_default()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Period-over-period changes with a leading `0.0` placeholder.
    pub fn deltas(&self) -> Vec<f64> {
        price_deltas(&self.prices)
    }
}

/// `delta[i] = p[i] - p[i-1]` for `i >= 1`, `delta[0] = 0`.
pub fn price_deltas(prices: &[f64]) -> Vec<f64> {
    if prices.is_empty() {
        return Vec::new();
    }
    std::iter::once(0.0)
        .chain(prices.windows(2).map(|w| {
            let change = w[1] - w[0];
            if change.is_finite() { change } else { 0.0 }
        }))
        .collect()
}

/// Simple period returns `(p[i] - p[i-1]) / p[i-1]`.
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
}

/// Price treated as a potential-energy level relative to a baseline price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyState {
    pub price: f64,
    pub energy: f64,
    pub energy_level: f64,
}

impl EnergyState {
    pub fn new(price: f64, baseline: f64) -> Self {
        let energy = price - baseline;
        Self {
            price,
            energy,
            energy_level: (energy.abs() + 1.0).ln(),
        }
    }
}
