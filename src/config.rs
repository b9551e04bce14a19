use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::demon::DemonModel;
use crate::entropy::EntropyEstimator;
use crate::error::ConfigError;
use crate::model::Interval;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_interval() -> String {
    "1mo".into()
}

fn default_forecast_horizon() -> usize {
    6
}

fn default_share_count() -> f64 {
    1.0
}

fn default_risk_percent() -> f64 {
    2.0
}

fn default_stop_loss_percent() -> f64 {
    5.0
}

fn default_take_profit_percent() -> f64 {
    10.0
}

fn default_backtest() -> String {
    "simple".into()
}

fn default_seed() -> u64 {
    42
}

fn default_simulations() -> usize {
    1000
}

fn default_monte_carlo_horizon() -> usize {
    12
}

fn default_walk_forward_steps() -> usize {
    10
}

fn default_demon_model() -> String {
    "rigorous".into()
}

fn default_entropy_estimator() -> String {
    "kernel".into()
}

fn default_output_format() -> String {
    "text".into()
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Model knobs, read leniently by `ModelParams::from_table`.
    #[serde(default)]
    pub params: toml::Table,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

#[derive(Debug, Deserialize)]
pub struct DataConfig {
    /// JSON price file; may be supplied on the command line instead.
    pub path: Option<String>,
    /// Accepted values: `"1d"` | `"1wk"` | `"1mo"`
    #[serde(default = "default_interval")]
    pub interval: String,
    /// Additional series analysed together as an equal-weight portfolio.
    #[serde(default)]
    pub portfolio: Vec<PortfolioEntryConfig>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: None,
            interval: default_interval(),
            portfolio: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PortfolioEntryConfig {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    /// Periods to forecast; 0 disables forecasting.
    #[serde(default = "default_forecast_horizon")]
    pub forecast_horizon: usize,
    pub buy_price: Option<f64>,
    #[serde(default = "default_share_count")]
    pub share_count: f64,
    #[serde(default = "default_risk_percent")]
    pub risk_percent: f64,
    #[serde(default = "default_stop_loss_percent")]
    pub stop_loss_percent: f64,
    #[serde(default = "default_take_profit_percent")]
    pub take_profit_percent: f64,
    /// Accepted values: `"none"` | `"simple"` | `"walkforward"` |
    /// `"montecarlo"` | `"optimize"`
    #[serde(default = "default_backtest")]
    pub backtest: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_simulations")]
    pub monte_carlo_simulations: usize,
    #[serde(default = "default_monte_carlo_horizon")]
    pub monte_carlo_horizon: usize,
    #[serde(default = "default_walk_forward_steps")]
    pub walk_forward_steps: usize,
    /// Accepted values: `"simple"` | `"rigorous"`
    #[serde(default = "default_demon_model")]
    pub demon_model: String,
    /// Accepted values: `"binned"` | `"kernel"`
    #[serde(default = "default_entropy_estimator")]
    pub entropy_estimator: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            forecast_horizon: default_forecast_horizon(),
            buy_price: None,
            share_count: default_share_count(),
            risk_percent: default_risk_percent(),
            stop_loss_percent: default_stop_loss_percent(),
            take_profit_percent: default_take_profit_percent(),
            backtest: default_backtest(),
            seed: default_seed(),
            monte_carlo_simulations: default_simulations(),
            monte_carlo_horizon: default_monte_carlo_horizon(),
            walk_forward_steps: default_walk_forward_steps(),
            demon_model: default_demon_model(),
            entropy_estimator: default_entropy_estimator(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_output_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_output_format(),
        }
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

pub const BACKTEST_MODES: &[&str] = &["none", "simple", "walkforward", "montecarlo", "optimize"];
const OUTPUT_FORMATS: &[&str] = &["text", "json"];

fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_enums(config)?;
    validate_risk(config)?;
    validate_simulation(config)?;
    validate_portfolio_names_unique(config)?;
    Ok(())
}

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_enums(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if Interval::from_str(&config.data.interval).is_none() {
        return Err(invalid(format!(
            "data.interval: unknown interval \"{}\"",
            config.data.interval
        )));
    }
    if !BACKTEST_MODES.contains(&config.analysis.backtest.as_str()) {
        return Err(invalid(format!(
            "analysis.backtest \"{}\" is not valid",
            config.analysis.backtest
        )));
    }
    if DemonModel::from_str(&config.analysis.demon_model).is_none() {
        return Err(invalid(format!(
            "analysis.demon_model \"{}\" is not valid",
            config.analysis.demon_model
        )));
    }
    if EntropyEstimator::from_str(&config.analysis.entropy_estimator).is_none() {
        return Err(invalid(format!(
            "analysis.entropy_estimator \"{}\" is not valid",
            config.analysis.entropy_estimator
        )));
    }
    if !OUTPUT_FORMATS.contains(&config.output.format.as_str()) {
        return Err(invalid(format!(
            "output.format \"{}\" is not valid",
            config.output.format
        )));
    }
    Ok(())
}

fn validate_risk(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let analysis = &config.analysis;
    let in_percent_range = |v: f64| v > 0.0 && v < 100.0;

    if !in_percent_range(analysis.stop_loss_percent) {
        return Err(invalid(format!(
            "analysis.stop_loss_percent must be in (0, 100), got {}",
            analysis.stop_loss_percent
        )));
    }
    if !(analysis.take_profit_percent > 0.0) {
        return Err(invalid(format!(
            "analysis.take_profit_percent must be > 0, got {}",
            analysis.take_profit_percent
        )));
    }
    if !in_percent_range(analysis.risk_percent) {
        return Err(invalid(format!(
            "analysis.risk_percent must be in (0, 100), got {}",
            analysis.risk_percent
        )));
    }
    if analysis.buy_price.is_some_and(|p| !(p > 0.0)) {
        return Err(invalid("analysis.buy_price must be > 0".into()));
    }
    Ok(())
}

fn validate_simulation(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let analysis = &config.analysis;
    if analysis.monte_carlo_simulations == 0 {
        return Err(invalid("analysis.monte_carlo_simulations must be > 0".into()));
    }
    if analysis.monte_carlo_horizon == 0 {
        return Err(invalid("analysis.monte_carlo_horizon must be > 0".into()));
    }
    if analysis.walk_forward_steps == 0 {
        return Err(invalid("analysis.walk_forward_steps must be > 0".into()));
    }
    Ok(())
}

fn validate_portfolio_names_unique(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let mut seen = std::collections::HashSet::new();
    for entry in &config.data.portfolio {
        if !seen.insert(entry.name.as_str()) {
            return Err(invalid(format!(
                "data.portfolio: duplicate name \"{}\"",
                entry.name
            )));
        }
    }
    Ok(())
}
