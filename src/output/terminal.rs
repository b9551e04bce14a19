use error_stack::Report;

use crate::analysis::{AnalysisReport, BacktestReport};
use crate::error::OutputError;
use crate::output::ReportSink;

/// Human-readable summary through the log subscriber.
pub struct TerminalSink;

impl ReportSink for TerminalSink {
    fn emit(&self, report: &AnalysisReport) -> Result<(), Report<OutputError>> {
        let thermo = &report.thermodynamics;
        tracing::info!(
            run_id = %report.run_id,
            observations = report.observations,
            first = %report.first_date,
            last = %report.last_date,
            price = report.current_price,
            "analysis summary"
        );
        tracing::info!(
            entropy = thermo.entropy,
            temperature = thermo.temperature,
            energy_barrier = thermo.energy_barrier,
            information_flow = thermo.information_flow,
            demon_efficiency = report.decomposition.demon_efficiency,
            combined_efficiency = thermo.combined_efficiency,
            big_moves = report.big_moves.len(),
            "demon decomposition"
        );
        tracing::info!(
            signal = report.signals.overall.label(),
            strength = report.signals.signal_strength,
            conviction = report.signals.strength(),
            "SIGNAL: {}",
            report.signals.overall.label(),
        );
        for contribution in &report.signals.contributions {
            tracing::info!(
                source = contribution.source,
                signal = contribution.kind.label(),
                weight = contribution.weight,
                "signal contribution"
            );
        }
        for pattern in &report.patterns {
            tracing::info!(
                pattern = pattern.kind.label(),
                date = %pattern.date,
                price = pattern.price,
                signal = pattern.signal.label(),
                "pattern detected"
            );
        }
        if let Some(forecast) = &report.forecast {
            tracing::info!(
                periods = forecast.dates.len(),
                final_price = forecast.final_price,
                optimistic = forecast.optimistic.last().copied(),
                pessimistic = forecast.pessimistic.last().copied(),
                "forecast"
            );
        }

        let risk = &report.risk;
        tracing::info!(
            entry = risk.entry_price,
            stop_loss = risk.stop_loss_price,
            take_profit = risk.take_profit_price,
            shares = risk.recommended_shares,
            risk_reward = risk.risk_reward_ratio,
            rating = ?risk.rating,
            "risk plan"
        );
        if let Some(profit) = &report.profit {
            tracing::info!(
                current_pnl = profit.current.amount,
                current_pct = profit.current.percent,
                predicted_pnl = profit.predicted.map(|p| p.amount),
                "position P&L"
            );
        }

        match &report.backtest {
            Some(BacktestReport::Simple(result)) => tracing::info!(
                trades = result.total_trades,
                total_return_pct = result.total_return_pct,
                sharpe = result.sharpe_ratio,
                max_drawdown_pct = result.max_drawdown_pct,
                win_rate = result.win_rate,
                "backtest"
            ),
            Some(BacktestReport::WalkForward(result)) => tracing::info!(
                periods = result.total_periods,
                out_of_sample_return = result.out_of_sample_return,
                consistency = result.consistency,
                "walk-forward"
            ),
            Some(BacktestReport::MonteCarlo(result)) => tracing::info!(
                simulations = result.simulations,
                mean_return = result.mean_return,
                var95 = result.var95,
                var99 = result.var99,
                expected_shortfall = result.expected_shortfall,
                "monte carlo"
            ),
            Some(BacktestReport::Optimize(result)) => tracing::info!(
                combinations = result.combinations,
                best_sharpe = result.best_sharpe,
                rsi_period = result.best_params.rsi_period,
                buy_threshold = result.best_params.signal_buy_threshold,
                "optimizer"
            ),
            None => tracing::info!("no backtest result"),
        }

        if let Some(portfolio) = &report.portfolio {
            tracing::info!(
                holdings = portfolio.holdings.len(),
                total_return_pct = portfolio.total_return_pct,
                volatility = portfolio.volatility,
                sharpe = portfolio.sharpe_ratio,
                diversification = portfolio.diversification_ratio,
                "portfolio"
            );
        }
        Ok(())
    }
}
