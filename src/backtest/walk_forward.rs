use chrono::NaiveDate;
use error_stack::{Report, ResultExt, bail};
use serde::Serialize;

use crate::backtest::{self, ExitRules};
use crate::error::AnalysisError;
use crate::model::PriceSeries;
use crate::params::ModelParams;
use crate::signal::expanding_signals;

const MIN_PRICES: usize = 20;
const TRAIN_RATIO: f64 = 0.7;
/// Threshold scaling applied by the per-step re-fit.
const THRESHOLD_ADJUST: f64 = 0.95;

#[derive(Debug, Clone, Serialize)]
pub struct WalkForwardStep {
    /// 1-based step number.
    pub period: usize,
    pub train_start: NaiveDate,
    pub train_end: NaiveDate,
    pub test_start: NaiveDate,
    pub test_end: NaiveDate,
    pub return_pct: f64,
    pub cumulative_return: f64,
    pub trades: usize,
    pub sharpe_ratio: f64,
    pub buy_threshold: f64,
    pub strong_buy_threshold: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalkForwardResult {
    pub steps: Vec<WalkForwardStep>,
    pub out_of_sample_return: f64,
    pub average_return: f64,
    /// Percent of recorded steps with a positive return.
    pub consistency: f64,
    pub total_periods: usize,
}

/// Re-fit parameters on a training window.
///
/// Scales both signal thresholds by a fixed factor; the training prices are
/// not consulted.
pub fn refit(base: &ModelParams) -> ModelParams {
    ModelParams {
        signal_buy_threshold: base.signal_buy_threshold * THRESHOLD_ADJUST,
        signal_strong_buy_threshold: base.signal_strong_buy_threshold * THRESHOLD_ADJUST,
        ..base.clone()
    }
}

/// Percent of positive returns; `0.0` for fewer than two.
pub fn consistency(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let positive = returns.iter().filter(|r| **r > 0.0).count();
    positive as f64 / returns.len() as f64 * 100.0
}

/// Anchored walk-forward: train on `[0, test_start)`, test on the next
/// slice, then extend the training window by that slice.
///
/// Test signals at each point use only the history up to that point.
pub fn run(
    series: &PriceSeries,
    params: &ModelParams,
    rules: ExitRules,
    steps: usize,
) -> Result<WalkForwardResult, Report<AnalysisError>> {
    let n = series.len();
    if n < MIN_PRICES {
        bail!(AnalysisError::InsufficientData {
            required: MIN_PRICES,
            available: n,
        });
    }
    if steps == 0 {
        bail!(AnalysisError::InvalidInput {
            reason: "walk-forward needs at least one step".into(),
        });
    }

    let train_size = (n as f64 * TRAIN_RATIO).floor() as usize;
    let slice = ((n - train_size) / steps).max(1);
    let fitted = refit(params);

    let mut records = Vec::new();
    let mut cumulative_return = 0.0;

    for step in 0..steps {
        let test_start = train_size + step * slice;
        if test_start >= n {
            break;
        }
        let test_end = (test_start + slice).min(n);
        let window = test_start..test_end;

        let signals = expanding_signals(&series.prices, window.clone(), &fitted)
            .change_context(AnalysisError::InvalidInput {
                reason: "indicator parameters rejected".into(),
            })?;

        let outcome = backtest::run(
            &series.dates[window.clone()],
            &series.prices[window.clone()],
            &signals,
            rules,
        );
        let result = match outcome {
            Ok(result) => result,
            Err(report) if matches!(report.current_context(), AnalysisError::NoTrades) => {
                tracing::debug!(step = step + 1, "walk-forward step produced no trades");
                continue;
            }
            Err(report) => return Err(report),
        };

        cumulative_return += result.total_return_pct;
        records.push(WalkForwardStep {
            period: step + 1,
            train_start: series.dates[0],
            train_end: series.dates[test_start - 1],
            test_start: series.dates[test_start],
            test_end: series.dates[test_end - 1],
            return_pct: result.total_return_pct,
            cumulative_return,
            trades: result.total_trades,
            sharpe_ratio: result.sharpe_ratio,
            buy_threshold: fitted.signal_buy_threshold,
            strong_buy_threshold: fitted.signal_strong_buy_threshold,
        });
    }

    let returns: Vec<f64> = records.iter().map(|r| r.return_pct).collect();
    let average_return = if records.is_empty() {
        0.0
    } else {
        cumulative_return / records.len() as f64
    };

    tracing::info!(
        recorded = records.len(),
        out_of_sample_return = cumulative_return,
        "walk-forward analysis complete"
    );

    Ok(WalkForwardResult {
        consistency: consistency(&returns),
        total_periods: records.len(),
        out_of_sample_return: cumulative_return,
        average_return,
        steps: records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::series_from_closes;

    const RULES: ExitRules = ExitRules {
        stop_loss_pct: 5.0,
        take_profit_pct: 10.0,
    };

    #[test]
    fn needs_twenty_prices() {
        let series = series_from_closes(&[100.0; 19]);
        let err = run(&series, &ModelParams::default(), RULES, 10).unwrap_err();
        assert!(matches!(
            err.current_context(),
            AnalysisError::InsufficientData { required: 20, available: 19 }
        ));
    }

    #[test]
    fn refit_scales_thresholds_only() {
        let base = ModelParams::default();
        let fitted = refit(&base);
        assert!((fitted.signal_buy_threshold - 0.95).abs() < 1e-12);
        assert!((fitted.signal_strong_buy_threshold - 1.9).abs() < 1e-12);
        assert_eq!(fitted.rsi_period, base.rsi_period);
    }

    #[test]
    fn consistency_needs_two_steps() {
        assert_eq!(consistency(&[5.0]), 0.0);
        assert!((consistency(&[5.0, -1.0, 2.0, 0.0]) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn flat_history_records_no_steps() {
        let series = series_from_closes(&[100.0; 40]);
        let result = run(&series, &ModelParams::default(), RULES, 10).unwrap();
        assert!(result.steps.is_empty());
        assert_eq!(result.out_of_sample_return, 0.0);
        assert_eq!(result.average_return, 0.0);
        assert_eq!(result.consistency, 0.0);
    }

    #[test]
    fn recorded_steps_lie_after_training_window() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + f64::from(i) * 0.5 + (f64::from(i) * 0.7).sin() * 8.0)
            .collect();
        let series = series_from_closes(&closes);
        let result = run(&series, &ModelParams::default(), RULES, 6).unwrap();
        assert!(!result.steps.is_empty());
        // 120 points: training ends at index 83, six slices of six points
        assert_eq!(result.steps[0].test_start, series.dates[84]);
        for step in &result.steps {
            let start = 84 + (step.period - 1) * 6;
            assert_eq!(step.test_start, series.dates[start]);
            assert_eq!(step.train_end, series.dates[start - 1]);
            assert!(step.test_start > step.train_end);
            assert!(step.test_start <= step.test_end);
            assert!(step.trades >= 1);
        }
        for pair in result.steps.windows(2) {
            assert!(pair[0].test_end < pair[1].test_start);
        }
        let sum: f64 = result.steps.iter().map(|s| s.return_pct).sum();
        assert!((result.out_of_sample_return - sum).abs() < 1e-9);
    }
}
