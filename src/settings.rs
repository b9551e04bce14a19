use crate::config::AppConfig;
use crate::demon::DemonModel;
use crate::entropy::EntropyEstimator;
use crate::model::Interval;
use crate::params::ModelParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacktestMode {
    None,
    Simple,
    WalkForward,
    MonteCarlo,
    Optimize,
}

impl BacktestMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "simple" => Some(Self::Simple),
            "walkforward" => Some(Self::WalkForward),
            "montecarlo" => Some(Self::MonteCarlo),
            "optimize" => Some(Self::Optimize),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Position sizing and exit levels, all in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskSettings {
    pub risk_percent: f64,
    pub stop_loss_percent: f64,
    pub take_profit_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonteCarloSettings {
    pub simulations: usize,
    pub horizon: usize,
}

/// Everything one analysis run needs, resolved from a validated config.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub interval: Interval,
    pub forecast_horizon: usize,
    pub buy_price: Option<f64>,
    pub share_count: f64,
    pub risk: RiskSettings,
    pub backtest: BacktestMode,
    pub seed: u64,
    pub monte_carlo: MonteCarloSettings,
    pub walk_forward_steps: usize,
    pub demon_model: DemonModel,
    pub entropy_estimator: EntropyEstimator,
    pub params: ModelParams,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            interval: Interval::Month1,
            forecast_horizon: 6,
            buy_price: None,
            share_count: 1.0,
            risk: RiskSettings {
                risk_percent: 2.0,
                stop_loss_percent: 5.0,
                take_profit_percent: 10.0,
            },
            backtest: BacktestMode::Simple,
            seed: 42,
            monte_carlo: MonteCarloSettings {
                simulations: 1000,
                horizon: 12,
            },
            walk_forward_steps: 10,
            demon_model: DemonModel::Rigorous,
            entropy_estimator: EntropyEstimator::Kernel,
            params: ModelParams::default(),
        }
    }
}

impl AnalysisSettings {
    /// Build settings from a validated `AppConfig`.
    ///
    /// Unrecognised enum strings cannot reach here after validation; they
    /// fall back to the defaults.
    pub fn from_config(config: &AppConfig) -> Self {
        let defaults = Self::default();
        let analysis = &config.analysis;

        Self {
            interval: Interval::from_str(&config.data.interval).unwrap_or(defaults.interval),
            forecast_horizon: analysis.forecast_horizon,
            buy_price: analysis.buy_price,
            share_count: analysis.share_count,
            risk: RiskSettings {
                risk_percent: analysis.risk_percent,
                stop_loss_percent: analysis.stop_loss_percent,
                take_profit_percent: analysis.take_profit_percent,
            },
            backtest: BacktestMode::from_str(&analysis.backtest).unwrap_or(defaults.backtest),
            seed: analysis.seed,
            monte_carlo: MonteCarloSettings {
                simulations: analysis.monte_carlo_simulations,
                horizon: analysis.monte_carlo_horizon,
            },
            walk_forward_steps: analysis.walk_forward_steps,
            demon_model: DemonModel::from_str(&analysis.demon_model)
                .unwrap_or(defaults.demon_model),
            entropy_estimator: EntropyEstimator::from_str(&analysis.entropy_estimator)
                .unwrap_or(defaults.entropy_estimator),
            params: ModelParams::from_table(&config.params),
        }
    }
}

impl OutputFormat {
    pub fn from_config(config: &AppConfig) -> Self {
        match config.output.format.as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> AppConfig {
        toml::from_str(toml).expect("parse failed")
    }

    #[test]
    fn settings_resolve_enums_and_params() {
        let config = parse(
            r#"
[general]

[data]
interval = "1wk"

[analysis]
backtest = "walkforward"
demon_model = "simple"
entropy_estimator = "binned"
stop_loss_percent = 7.5
seed = 9

[params]
rsi_period = 10

[output]
format = "json"
"#,
        );
        let settings = AnalysisSettings::from_config(&config);
        assert_eq!(settings.interval, Interval::Week1);
        assert_eq!(settings.backtest, BacktestMode::WalkForward);
        assert_eq!(settings.demon_model, DemonModel::Simple);
        assert_eq!(settings.entropy_estimator, EntropyEstimator::Binned);
        assert_eq!(settings.risk.stop_loss_percent, 7.5);
        assert_eq!(settings.seed, 9);
        assert_eq!(settings.params.rsi_period, 10);
        assert_eq!(OutputFormat::from_config(&config), OutputFormat::Json);
    }

    #[test]
    fn defaults_match_config_defaults() {
        let settings = AnalysisSettings::from_config(&parse("[general]\n"));
        let defaults = AnalysisSettings::default();
        assert_eq!(settings.interval, defaults.interval);
        assert_eq!(settings.backtest, defaults.backtest);
        assert_eq!(settings.seed, defaults.seed);
        assert_eq!(settings.risk, defaults.risk);
        assert_eq!(settings.monte_carlo, defaults.monte_carlo);
        assert_eq!(settings.params, defaults.params);
    }

    #[test]
    fn every_accepted_backtest_mode_parses() {
        for mode in crate::config::BACKTEST_MODES {
            assert!(BacktestMode::from_str(mode).is_some(), "{mode}");
        }
    }
}
