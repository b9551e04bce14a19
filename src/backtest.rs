pub mod metrics;
pub mod monte_carlo;
pub mod optimizer;
pub mod walk_forward;

use chrono::NaiveDate;
use error_stack::{Report, bail};
use serde::Serialize;

use crate::error::AnalysisError;
use crate::indicator::IndicatorSet;
use crate::model::PriceSeries;
use crate::signal::{SignalKind, historical_signals};

pub const INITIAL_EQUITY: f64 = 10_000.0;

/// Price-based exit levels relative to the entry price, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitRules {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitReason {
    #[serde(rename = "Signal Exit")]
    Signal,
    #[serde(rename = "Stop Loss")]
    StopLoss,
    #[serde(rename = "Take Profit")]
    TakeProfit,
    #[serde(rename = "End of Period")]
    EndOfPeriod,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub return_pct: f64,
    pub exit_reason: ExitReason,
    pub days_held: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    /// One point per price; starts at [`INITIAL_EQUITY`].
    pub equity: Vec<f64>,
    pub dates: Vec<NaiveDate>,
    pub total_return: f64,
    pub total_return_pct: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_return: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
}

/// Simple backtest driven by the moving-average crossover proxy.
pub fn run_simple(
    series: &PriceSeries,
    indicators: &IndicatorSet,
    rules: ExitRules,
) -> Result<BacktestResult, Report<AnalysisError>> {
    let signals = historical_signals(&series.prices, indicators);
    run(&series.dates, &series.prices, &signals, rules)
}

/// Replay `signals` over `prices` with a single all-in position.
///
/// Fails with [`AnalysisError::NoTrades`] when no position is ever opened.
pub fn run(
    dates: &[NaiveDate],
    prices: &[f64],
    signals: &[SignalKind],
    rules: ExitRules,
) -> Result<BacktestResult, Report<AnalysisError>> {
    if prices.is_empty() {
        bail!(AnalysisError::InsufficientData {
            required: 1,
            available: 0,
        });
    }
    if dates.len() != prices.len() || signals.len() != prices.len() {
        bail!(AnalysisError::InvalidInput {
            reason: format!(
                "length mismatch: {} dates, {} prices, {} signals",
                dates.len(),
                prices.len(),
                signals.len()
            ),
        });
    }

    let mut engine = BacktestEngine::new(dates, prices, rules);
    engine.execute(signals);
    engine.build_result()
}

struct OpenPosition {
    entry_date: NaiveDate,
    entry_price: f64,
    equity_at_entry: f64,
}

impl OpenPosition {
    fn return_at(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price
    }
}

struct BacktestEngine<'a> {
    dates: &'a [NaiveDate],
    prices: &'a [f64],
    rules: ExitRules,
    position: Option<OpenPosition>,
    trades: Vec<Trade>,
    equity_curve: Vec<f64>,
}

impl<'a> BacktestEngine<'a> {
    fn new(dates: &'a [NaiveDate], prices: &'a [f64], rules: ExitRules) -> Self {
        Self {
            dates,
            prices,
            rules,
            position: None,
            trades: Vec::new(),
            equity_curve: vec![INITIAL_EQUITY],
        }
    }

    fn execute(&mut self, signals: &[SignalKind]) {
        for index in 1..self.prices.len() {
            let signal = signals[index];
            let Some(position) = &self.position else {
                if signal.is_buy() {
                    self.open(index);
                }
                self.record_equity(index);
                continue;
            };
            match self.exit_reason(position, signal, index) {
                Some(reason) => {
                    let equity = self.close(index, reason);
                    self.equity_curve.push(equity);
                }
                None => self.record_equity(index),
            }
        }
        self.force_close();
    }

    /// Signal exits take priority over the stop-loss, which takes priority
    /// over the take-profit.
    fn exit_reason(
        &self,
        position: &OpenPosition,
        signal: SignalKind,
        index: usize,
    ) -> Option<ExitReason> {
        let price = self.prices[index];
        let stop_loss = position.entry_price * (1.0 - self.rules.stop_loss_pct / 100.0);
        let take_profit = position.entry_price * (1.0 + self.rules.take_profit_pct / 100.0);

        if signal.is_sell() {
            Some(ExitReason::Signal)
        } else if price <= stop_loss {
            Some(ExitReason::StopLoss)
        } else if price >= take_profit {
            Some(ExitReason::TakeProfit)
        } else {
            None
        }
    }

    fn open(&mut self, index: usize) {
        self.position = Some(OpenPosition {
            entry_date: self.dates[index],
            entry_price: self.prices[index],
            equity_at_entry: self.current_equity(),
        });
    }

    /// Close the open position at `index` and return the realised equity.
    fn close(&mut self, index: usize, reason: ExitReason) -> f64 {
        let Some(position) = self.position.take() else {
            return self.current_equity();
        };
        let exit_price = self.prices[index];
        let exit_date = self.dates[index];
        let trade_return = position.return_at(exit_price);

        self.trades.push(Trade {
            entry_date: position.entry_date,
            exit_date,
            entry_price: position.entry_price,
            exit_price,
            return_pct: trade_return * 100.0,
            exit_reason: reason,
            days_held: (exit_date - position.entry_date).num_days(),
        });

        position.equity_at_entry * (1.0 + trade_return)
    }

    /// Any position still open is closed at the last price; its realised
    /// equity replaces the last mark-to-market point.
    fn force_close(&mut self) {
        if self.position.is_none() {
            return;
        }
        let last = self.prices.len() - 1;
        let equity = self.close(last, ExitReason::EndOfPeriod);
        if let Some(point) = self.equity_curve.last_mut() {
            *point = equity;
        }
    }

    fn record_equity(&mut self, index: usize) {
        let equity = match &self.position {
            Some(position) => {
                position.equity_at_entry * (1.0 + position.return_at(self.prices[index]))
            }
            None => self.current_equity(),
        };
        self.equity_curve.push(equity);
    }

    fn current_equity(&self) -> f64 {
        self.equity_curve.last().copied().unwrap_or(INITIAL_EQUITY)
    }

    fn build_result(self) -> Result<BacktestResult, Report<AnalysisError>> {
        if self.trades.is_empty() {
            tracing::debug!(points = self.prices.len(), "backtest produced no trades");
            bail!(AnalysisError::NoTrades);
        }

        let returns: Vec<f64> = self.trades.iter().map(|t| t.return_pct).collect();
        let final_equity = self.current_equity();
        let total_return = final_equity - INITIAL_EQUITY;
        let drawdown = metrics::max_drawdown(&self.equity_curve);

        Ok(BacktestResult {
            total_return,
            total_return_pct: total_return / INITIAL_EQUITY * 100.0,
            sharpe_ratio: metrics::sharpe_ratio(&returns),
            sortino_ratio: metrics::sortino_ratio(&returns),
            max_drawdown: drawdown.amount,
            max_drawdown_pct: drawdown.pct,
            win_rate: metrics::win_rate(&returns),
            profit_factor: metrics::profit_factor(&returns),
            avg_return: crate::stats::mean(&returns),
            total_trades: self.trades.len(),
            winning_trades: returns.iter().filter(|r| **r > 0.0).count(),
            losing_trades: returns.iter().filter(|r| **r < 0.0).count(),
            trades: self.trades,
            equity: self.equity_curve,
            dates: self.dates.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::series_from_closes;
    use crate::params::ModelParams;

    const RULES: ExitRules = ExitRules {
        stop_loss_pct: 5.0,
        take_profit_pct: 10.0,
    };

    fn replay(closes: &[f64], signals: &[SignalKind]) -> Result<BacktestResult, Report<AnalysisError>> {
        let series = series_from_closes(closes);
        run(&series.dates, &series.prices, signals, RULES)
    }

    use SignalKind::{Buy, Hold, Sell};

    #[test]
    fn flat_series_produces_no_trades() {
        let series = series_from_closes(&[100.0; 80]);
        let indicators = IndicatorSet::compute(&series.prices, &ModelParams::default()).unwrap();
        let err = run_simple(&series, &indicators, RULES).unwrap_err();
        assert!(matches!(err.current_context(), AnalysisError::NoTrades));
    }

    #[test]
    fn signal_exit_realises_return() {
        let result = replay(
            &[100.0, 100.0, 102.0, 104.0],
            &[Hold, Buy, Hold, Sell],
        )
        .unwrap();
        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::Signal);
        assert!((trade.return_pct - 4.0).abs() < 1e-9);
        assert_eq!(result.equity.len(), 4);
        assert_eq!(result.equity[0], INITIAL_EQUITY);
        assert!((result.equity[2] - 10_200.0).abs() < 1e-9);
        assert!((result.equity[3] - 10_400.0).abs() < 1e-9);
        assert!((result.total_return_pct - 4.0).abs() < 1e-9);
    }

    #[test]
    fn signal_exit_checked_before_stop_loss() {
        let result = replay(&[100.0, 100.0, 80.0], &[Hold, Buy, Sell]).unwrap();
        assert_eq!(result.trades[0].exit_reason, ExitReason::Signal);
    }

    #[test]
    fn stop_loss_and_take_profit() {
        let result = replay(
            &[100.0, 100.0, 94.0, 100.0, 111.0],
            &[Hold, Buy, Hold, Buy, Hold],
        )
        .unwrap();
        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].exit_reason, ExitReason::StopLoss);
        assert_eq!(result.trades[1].exit_reason, ExitReason::TakeProfit);
        // 10000 * 0.94 * 1.11
        let final_equity = result.equity.last().copied().unwrap();
        assert!((final_equity - 10_000.0 * 0.94 * 1.11).abs() < 1e-6);
        assert_eq!(result.winning_trades, 1);
        assert_eq!(result.losing_trades, 1);
        assert!((result.win_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn open_position_closed_at_end_of_period() {
        let result = replay(&[100.0, 100.0, 103.0], &[Hold, Buy, Hold]).unwrap();
        assert_eq!(result.trades[0].exit_reason, ExitReason::EndOfPeriod);
        assert_eq!(result.equity.len(), 3);
        assert!((result.equity[2] - 10_300.0).abs() < 1e-9);
    }

    #[test]
    fn mark_to_market_does_not_compound() {
        let result = replay(
            &[100.0, 100.0, 102.0, 103.0, 104.0],
            &[Hold, Buy, Hold, Hold, Sell],
        )
        .unwrap();
        assert!((result.equity[3] - 10_300.0).abs() < 1e-9);
        assert!((result.equity[4] - 10_400.0).abs() < 1e-9);
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let err = replay(&[100.0, 101.0], &[Hold]).unwrap_err();
        assert!(matches!(err.current_context(), AnalysisError::InvalidInput { .. }));
    }

    #[test]
    fn days_held_from_dates() {
        let result = replay(&[100.0, 100.0, 104.0], &[Hold, Buy, Sell]).unwrap();
        // 2020-02-01 -> 2020-03-01
        assert_eq!(result.trades[0].days_held, 29);
    }

    #[test]
    fn crossover_proxy_trades_after_warm_up() {
        // price clears the final short average only near the end
        let closes: Vec<f64> = (0..70).map(|i| 100.0 + f64::from(i)).collect();
        let series = series_from_closes(&closes);
        let indicators = IndicatorSet::compute(&series.prices, &ModelParams::default()).unwrap();
        let result = run_simple(&series, &indicators, RULES).unwrap();
        assert!(result.total_trades >= 1);
        assert_eq!(result.equity.len(), closes.len());
        assert_eq!(result.equity[0], INITIAL_EQUITY);
    }
}
