pub mod json;

use error_stack::Report;

use crate::error::SourceError;
use crate::model::Observation;

/// Provider of dated closing prices, oldest first.
pub trait PriceSource {
    /// Human-readable origin of the prices, used in logs.
    fn describe(&self) -> String;

    fn load(&self) -> Result<Vec<Observation>, Report<SourceError>>;
}
