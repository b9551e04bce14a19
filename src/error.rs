use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum SourceError {
    #[display("failed to read price file")]
    ReadFile,
    #[display("failed to parse price file: {reason}")]
    Parse { reason: String },
}

#[derive(Debug, Display, Error)]
pub enum AnalysisError {
    #[display("insufficient data: need {required}, got {available}")]
    InsufficientData { required: usize, available: usize },
    #[display("backtest produced no trades")]
    NoTrades,
    #[display("invalid input: {reason}")]
    InvalidInput { reason: String },
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

#[derive(Debug, Display, Error)]
pub enum OutputError {
    #[display("failed to serialize report")]
    Serialize,
    #[display("failed to write report")]
    Write,
}
