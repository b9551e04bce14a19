//! One analysis run: decomposition, indicators, signals, patterns, forecast,
//! risk plan and the requested backtest, assembled into a single report.

use chrono::{DateTime, NaiveDate, Utc};
use error_stack::{Report, ResultExt};
use serde::Serialize;
use uuid::Uuid;

use crate::backtest::monte_carlo::{self, MonteCarloResult};
use crate::backtest::optimizer::{self, OptimizationResult};
use crate::backtest::walk_forward::{self, WalkForwardResult};
use crate::backtest::{self, BacktestResult, ExitRules};
use crate::demon::{self, BigMove, Decomposition, DemonModel};
use crate::entropy::{self, EntropyEstimator};
use crate::error::AnalysisError;
use crate::forecast::{self, Forecast, ForecastContext};
use crate::indicator::IndicatorSet;
use crate::model::{EnergyState, Interval, PriceSeries};
use crate::params::ModelParams;
use crate::pattern::{self, Pattern};
use crate::portfolio::{self, PortfolioReport};
use crate::risk::{self, ProfitProjection, RiskPlan};
use crate::settings::{AnalysisSettings, BacktestMode};
use crate::signal::{self, SignalKind, SignalSet};
use crate::stats::SeedPlan;

/// Seed path of the historical stochastic replay.
const REPLAY_SEED_PATH: u64 = 0;

#[derive(Debug, Clone, Serialize)]
pub struct Thermodynamics {
    pub model: DemonModel,
    pub estimator: EntropyEstimator,
    pub entropy: f64,
    pub max_entropy: f64,
    pub temperature: f64,
    pub energy_barrier: f64,
    pub information_flow: f64,
    pub combined_efficiency: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconstructedPaths {
    pub deterministic: Vec<f64>,
    pub stochastic: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BacktestReport {
    Simple(BacktestResult),
    WalkForward(WalkForwardResult),
    MonteCarlo(MonteCarloResult),
    Optimize(OptimizationResult),
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    pub interval: Interval,
    pub observations: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub current_price: f64,
    /// Parameters the indicators and signals were computed with.
    pub params: ModelParams,
    pub thermodynamics: Thermodynamics,
    pub decomposition: Decomposition,
    pub energy_states: Vec<EnergyState>,
    pub paths: ReconstructedPaths,
    pub big_moves: Vec<BigMove>,
    pub indicators: IndicatorSet,
    pub signals: SignalSet,
    pub patterns: Vec<Pattern>,
    pub forecast: Option<Forecast>,
    pub risk: RiskPlan,
    pub profit: Option<ProfitProjection>,
    /// Absent when no backtest was requested, the overall signal is HOLD,
    /// or it could not run.
    pub backtest: Option<BacktestReport>,
    pub portfolio: Option<PortfolioReport>,
}

/// Analyse `series`, plus `holdings` as a portfolio when given.
///
/// Sections whose evaluation reports missing history or no trades are left
/// out of the report; any other failure aborts the run. In optimize mode the
/// grid search runs first and its best parameters drive the analysis.
pub fn run(
    series: &PriceSeries,
    settings: &AnalysisSettings,
    holdings: &[(String, PriceSeries)],
) -> Result<AnalysisReport, Report<AnalysisError>> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("analysis", %run_id, observations = series.len());
    let _guard = span.enter();

    let optimization = match settings.backtest {
        BacktestMode::Optimize => {
            skippable(optimizer::run(series, &settings.params), "optimizer")?
        }
        _ => None,
    };
    let active = optimization
        .as_ref()
        .map_or(&settings.params, |result| &result.best_params)
        .clone();
    let params = &active;
    let prices = &series.prices;
    let deltas = series.deltas();
    let changes = deltas.get(1..).unwrap_or_default();

    let entropy = settings.entropy_estimator.estimate(changes, params.entropy_bins);
    let (decomposition, temperature, energy_barrier) = match settings.demon_model {
        DemonModel::Rigorous => {
            let temperature = entropy::thermodynamic_temperature(prices);
            let barrier = entropy::thermodynamic_energy_barrier(prices, entropy);
            let decomposition = demon::decompose_rigorous(&deltas, entropy, temperature, barrier);
            (decomposition, temperature, barrier)
        }
        DemonModel::Simple => {
            let decomposition = demon::decompose_simple(&deltas, entropy);
            let temperature = entropy::market_temperature(&decomposition.unexpected);
            (decomposition, temperature, entropy::energy_barrier(prices))
        }
    };
    let information_flow = demon::information_flow(&decomposition.unexpected, entropy);
    tracing::info!(entropy, temperature, energy_barrier, information_flow, "decomposition complete");

    let seeds = SeedPlan::new(settings.seed);
    let paths = ReconstructedPaths {
        deterministic: demon::reconstruct_deterministic(prices, &decomposition),
        stochastic: demon::reconstruct_stochastic(
            prices,
            &decomposition,
            information_flow,
            params.energy_barrier_factor,
            |i| seeds.draw(REPLAY_SEED_PATH, i),
        ),
    };

    let indicators = IndicatorSet::compute(prices, params).change_context(
        AnalysisError::InvalidInput {
            reason: "indicator parameters rejected".into(),
        },
    )?;
    let signals = signal::generate(&indicators, params);
    tracing::info!(
        signal = signals.overall.label(),
        strength = signals.signal_strength,
        "signal generated"
    );

    let forecast = forecast::project(
        series,
        ForecastContext {
            decomposition: &decomposition,
            information_flow,
            params,
            seeds,
        },
        settings.forecast_horizon,
    );

    let current_price = series.last_price();
    let predicted_price = forecast.as_ref().map(|f| f.final_price);
    let backtest = match optimization {
        Some(result) => Some(BacktestReport::Optimize(result)),
        None => run_backtest(series, settings, &indicators, &signals)?,
    };
    let portfolio = analyze_portfolio(holdings)?;

    Ok(AnalysisReport {
        run_id,
        generated_at: Utc::now(),
        seed: settings.seed,
        interval: series.interval,
        observations: series.len(),
        first_date: series.dates[0],
        last_date: series.dates[series.len() - 1],
        current_price,
        params: params.clone(),
        thermodynamics: Thermodynamics {
            model: settings.demon_model,
            estimator: settings.entropy_estimator,
            entropy,
            max_entropy: (series.len() as f64).log2(),
            temperature,
            energy_barrier,
            information_flow,
            combined_efficiency: demon::combined_efficiency(&decomposition, entropy),
        },
        energy_states: entropy::price_energy_states(prices),
        big_moves: demon::big_moves(&series.dates, &decomposition.unexpected),
        patterns: pattern::detect(&series.dates, prices),
        risk: risk::plan(current_price, settings.buy_price, settings.risk),
        profit: risk::project_profit(
            settings.buy_price,
            settings.share_count,
            current_price,
            predicted_price,
        ),
        decomposition,
        paths,
        indicators,
        signals,
        forecast,
        backtest,
        portfolio,
    })
}

/// Backtest in the configured mode; nothing to test while the signal says
/// HOLD.
fn run_backtest(
    series: &PriceSeries,
    settings: &AnalysisSettings,
    indicators: &IndicatorSet,
    signals: &SignalSet,
) -> Result<Option<BacktestReport>, Report<AnalysisError>> {
    let gated = !matches!(settings.backtest, BacktestMode::None | BacktestMode::Optimize);
    if gated && signals.overall == SignalKind::Hold {
        tracing::info!(mode = ?settings.backtest, "backtest skipped on HOLD signal");
        return Ok(None);
    }
    let rules = ExitRules {
        stop_loss_pct: settings.risk.stop_loss_percent,
        take_profit_pct: settings.risk.take_profit_percent,
    };
    let outcome = match settings.backtest {
        BacktestMode::None => return Ok(None),
        BacktestMode::Simple => {
            backtest::run_simple(series, indicators, rules).map(BacktestReport::Simple)
        }
        BacktestMode::WalkForward => {
            walk_forward::run(series, &settings.params, rules, settings.walk_forward_steps)
                .map(BacktestReport::WalkForward)
        }
        BacktestMode::MonteCarlo => monte_carlo::run(&series.prices, settings.monte_carlo)
            .map(BacktestReport::MonteCarlo),
        // the grid search runs ahead of the analysis
        BacktestMode::Optimize => return Ok(None),
    };
    skippable(outcome, "backtest")
}

fn analyze_portfolio(
    holdings: &[(String, PriceSeries)],
) -> Result<Option<PortfolioReport>, Report<AnalysisError>> {
    if holdings.is_empty() {
        return Ok(None);
    }
    skippable(portfolio::analyze(holdings), "portfolio")
}

/// Turn "cannot proceed" outcomes into an absent section.
fn skippable<T>(
    outcome: Result<T, Report<AnalysisError>>,
    section: &'static str,
) -> Result<Option<T>, Report<AnalysisError>> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(report) => match report.current_context() {
            AnalysisError::NoTrades | AnalysisError::InsufficientData { .. } => {
                tracing::warn!(section, reason = %report.current_context(), "section skipped");
                Ok(None)
            }
            AnalysisError::InvalidInput { .. } => Err(report),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::series_from_closes;

    fn closes(n: u32) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + f64::from(i) * 0.8 + (f64::from(i) * 0.6).sin() * 6.0)
            .collect()
    }

    #[test]
    fn report_covers_every_section() {
        let series = series_from_closes(&closes(80));
        let settings = AnalysisSettings {
            buy_price: Some(120.0),
            share_count: 10.0,
            ..AnalysisSettings::default()
        };
        let report = run(&series, &settings, &[]).unwrap();

        assert_eq!(report.observations, 80);
        assert_eq!(report.decomposition.planned.len(), 80);
        assert_eq!(report.paths.deterministic.len(), 80);
        assert_eq!(report.paths.stochastic.len(), 80);
        assert_eq!(report.energy_states.len(), 80);
        assert_eq!(report.forecast.as_ref().map(|f| f.dates.len()), Some(6));
        assert!(report.profit.as_ref().is_some_and(|p| p.predicted.is_some()));
        assert!(report.portfolio.is_none());
        assert!(report.indicators.rsi.is_some());
    }

    #[test]
    fn decomposition_reproduces_price_changes() {
        let series = series_from_closes(&closes(40));
        let report = run(&series, &AnalysisSettings::default(), &[]).unwrap();
        let deltas = series.deltas();
        let d = &report.decomposition;
        for i in 1..deltas.len() {
            assert!((d.planned[i] + d.unexpected[i] - deltas[i]).abs() < 1e-9);
        }
        for (a, b) in report.paths.deterministic.iter().zip(&series.prices) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn same_seed_gives_same_numbers() {
        let series = series_from_closes(&closes(60));
        let settings = AnalysisSettings::default();
        let a = run(&series, &settings, &[]).unwrap();
        let b = run(&series, &settings, &[]).unwrap();
        assert_ne!(a.run_id, b.run_id);
        assert_eq!(a.paths.stochastic, b.paths.stochastic);
        assert_eq!(
            a.forecast.map(|f| f.base),
            b.forecast.map(|f| f.base)
        );
    }

    #[test]
    fn flat_series_skips_backtest() {
        let series = series_from_closes(&[100.0; 60]);
        let report = run(&series, &AnalysisSettings::default(), &[]).unwrap();
        assert!(report.backtest.is_none());
    }

    #[test]
    fn short_series_skips_monte_carlo() {
        let series = series_from_closes(&closes(10));
        let settings = AnalysisSettings {
            backtest: BacktestMode::MonteCarlo,
            ..AnalysisSettings::default()
        };
        let report = run(&series, &settings, &[]).unwrap();
        assert!(report.backtest.is_none());
    }

    fn with_thresholds(backtest: BacktestMode, buy: f64, strong_buy: f64) -> AnalysisSettings {
        let defaults = AnalysisSettings::default();
        AnalysisSettings {
            backtest,
            params: ModelParams {
                signal_buy_threshold: buy,
                signal_strong_buy_threshold: strong_buy,
                ..defaults.params.clone()
            },
            ..defaults
        }
    }

    #[test]
    fn monte_carlo_mode_is_reported() {
        // zero thresholds never classify as HOLD
        let series = series_from_closes(&closes(40));
        let settings = with_thresholds(BacktestMode::MonteCarlo, 0.0, 0.0);
        let report = run(&series, &settings, &[]).unwrap();
        assert_ne!(report.signals.overall, SignalKind::Hold);
        assert!(matches!(report.backtest, Some(BacktestReport::MonteCarlo(_))));
    }

    #[test]
    fn hold_signal_skips_every_backtest_mode() {
        let series = series_from_closes(&closes(90));
        for mode in [
            BacktestMode::Simple,
            BacktestMode::WalkForward,
            BacktestMode::MonteCarlo,
        ] {
            let settings = with_thresholds(mode, 1e9, 2e9);
            let report = run(&series, &settings, &[]).unwrap();
            assert_eq!(report.signals.overall, SignalKind::Hold);
            assert!(report.backtest.is_none(), "{mode:?} ran on HOLD");
        }
    }

    #[test]
    fn optimize_mode_analyses_with_best_params() {
        let series = series_from_closes(&closes(80));
        let settings = AnalysisSettings {
            backtest: BacktestMode::Optimize,
            ..AnalysisSettings::default()
        };
        let report = run(&series, &settings, &[]).unwrap();
        let Some(BacktestReport::Optimize(result)) = &report.backtest else {
            panic!("optimizer result missing");
        };
        assert_eq!(report.params, result.best_params);
        assert_eq!(result.combinations, 12);
    }

    #[test]
    fn other_modes_keep_configured_params() {
        let series = series_from_closes(&closes(40));
        let settings = AnalysisSettings::default();
        let report = run(&series, &settings, &[]).unwrap();
        assert_eq!(report.params, settings.params);
    }

    #[test]
    fn simple_model_runs() {
        let series = series_from_closes(&closes(30));
        let settings = AnalysisSettings {
            demon_model: DemonModel::Simple,
            entropy_estimator: EntropyEstimator::Binned,
            backtest: BacktestMode::None,
            ..AnalysisSettings::default()
        };
        let report = run(&series, &settings, &[]).unwrap();
        assert_eq!(report.thermodynamics.model, DemonModel::Simple);
        assert!(report.thermodynamics.temperature >= 0.0);
        assert!(report.backtest.is_none());
    }

    #[test]
    fn single_holding_skips_portfolio() {
        let series = series_from_closes(&closes(30));
        let holdings = vec![("A".to_string(), series_from_closes(&closes(30)))];
        let report = run(&series, &AnalysisSettings::default(), &holdings).unwrap();
        assert!(report.portfolio.is_none());

        let holdings = vec![
            ("A".to_string(), series_from_closes(&closes(30))),
            ("B".to_string(), series_from_closes(&closes(20))),
        ];
        let report = run(&series, &AnalysisSettings::default(), &holdings).unwrap();
        assert_eq!(report.portfolio.map(|p| p.holdings.len()), Some(2));
    }
}
