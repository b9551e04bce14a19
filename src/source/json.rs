use std::path::{Path, PathBuf};

use error_stack::{Report, ResultExt};

use crate::error::SourceError;
use crate::model::Observation;
use crate::source::PriceSource;

/// Reads a JSON array of `{ "date": "YYYY-MM-DD", "close": <number | null> }`.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl PriceSource for JsonFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Vec<Observation>, Report<SourceError>> {
        let content = std::fs::read_to_string(&self.path)
            .change_context(SourceError::ReadFile)
            .attach_with(|| format!("path: {}", self.path.display()))?;

        let observations = parse(&content)
            .attach_with(|| format!("path: {}", self.path.display()))?;

        tracing::debug!(
            path = %self.path.display(),
            observations = observations.len(),
            "price file loaded"
        );
        Ok(observations)
    }
}

fn parse(content: &str) -> Result<Vec<Observation>, Report<SourceError>> {
    serde_json::from_str(content).change_context(SourceError::Parse {
        reason: "expected an array of {date, close} records".into(),
    })
}
