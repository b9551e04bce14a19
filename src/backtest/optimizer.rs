use error_stack::{Report, ResultExt};
use serde::Serialize;

use crate::backtest::{self, ExitRules};
use crate::error::AnalysisError;
use crate::indicator::IndicatorSet;
use crate::model::PriceSeries;
use crate::params::ModelParams;
use crate::signal::{self, SignalKind};

const RSI_PERIODS: [usize; 3] = [10, 12, 14];
const BUY_THRESHOLDS: [f64; 2] = [0.5, 1.0];
const STRONG_BUY_THRESHOLDS: [f64; 2] = [1.5, 2.0];
const TOP_TRIALS: usize = 10;
const GRID_RULES: ExitRules = ExitRules {
    stop_loss_pct: 5.0,
    take_profit_pct: 10.0,
};

#[derive(Debug, Clone, Serialize)]
pub struct Trial {
    pub rsi_period: usize,
    pub buy_threshold: f64,
    pub strong_buy_threshold: f64,
    pub sharpe_ratio: f64,
    pub total_return_pct: f64,
    pub total_trades: usize,
    pub win_rate: f64,
    pub max_drawdown_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    /// Base parameters with the best trial applied, or unchanged when no
    /// combination traded.
    pub best_params: ModelParams,
    pub best_sharpe: Option<f64>,
    /// Up to ten trials, best Sharpe first.
    pub top_trials: Vec<Trial>,
    pub combinations: usize,
}

/// Grid search over RSI period and signal thresholds.
///
/// A combination is backtested only when its current overall signal is not
/// HOLD; combinations without trades are dropped.
pub fn run(
    series: &PriceSeries,
    base: &ModelParams,
) -> Result<OptimizationResult, Report<AnalysisError>> {
    let mut trials: Vec<(Trial, ModelParams)> = Vec::new();
    let mut combinations = 0;

    for rsi_period in RSI_PERIODS {
        for buy_threshold in BUY_THRESHOLDS {
            for strong_buy_threshold in STRONG_BUY_THRESHOLDS {
                combinations += 1;
                let params = ModelParams {
                    rsi_period,
                    signal_buy_threshold: buy_threshold,
                    signal_strong_buy_threshold: strong_buy_threshold,
                    ..base.clone()
                };
                if let Some(trial) = evaluate(series, &params)? {
                    trials.push((trial, params));
                }
            }
        }
    }

    // stable: earlier combinations win ties
    trials.sort_by(|a, b| b.0.sharpe_ratio.total_cmp(&a.0.sharpe_ratio));

    let (best_params, best_sharpe) = match trials.first() {
        Some((trial, params)) => (params.clone(), Some(trial.sharpe_ratio)),
        None => (base.clone(), None),
    };
    tracing::info!(combinations, traded = trials.len(), ?best_sharpe, "grid search complete");

    Ok(OptimizationResult {
        best_params,
        best_sharpe,
        top_trials: trials
            .into_iter()
            .take(TOP_TRIALS)
            .map(|(trial, _)| trial)
            .collect(),
        combinations,
    })
}

fn evaluate(
    series: &PriceSeries,
    params: &ModelParams,
) -> Result<Option<Trial>, Report<AnalysisError>> {
    let indicators = IndicatorSet::compute(&series.prices, params).change_context(
        AnalysisError::InvalidInput {
            reason: "indicator parameters rejected".into(),
        },
    )?;
    if signal::generate(&indicators, params).overall == SignalKind::Hold {
        return Ok(None);
    }

    match backtest::run_simple(series, &indicators, GRID_RULES) {
        Ok(result) => Ok(Some(Trial {
            rsi_period: params.rsi_period,
            buy_threshold: params.signal_buy_threshold,
            strong_buy_threshold: params.signal_strong_buy_threshold,
            sharpe_ratio: result.sharpe_ratio,
            total_return_pct: result.total_return_pct,
            total_trades: result.total_trades,
            win_rate: result.win_rate,
            max_drawdown_pct: result.max_drawdown_pct,
        })),
        Err(report) if matches!(report.current_context(), AnalysisError::NoTrades) => Ok(None),
        Err(report) => Err(report),
    }
}
