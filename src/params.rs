use serde::Serialize;

/// Tunable knobs of the model, signal generator and forecast.
///
/// Built from a free-form TOML table: missing, non-numeric or non-finite
/// entries fall back to the default, out-of-range numbers are clamped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelParams {
    /// Volatility clustering decay per forecast step. Default 0.9, [0.5, 0.99].
    pub vol_decay: f64,
    /// Weight of recent momentum in forecasts. Default 0.3, [0, 1].
    pub momentum_factor: f64,
    /// Scales |energy| into a transition barrier. Default 0.01, [0.001, 0.1].
    pub energy_barrier_factor: f64,
    /// Multiplier on demon efficiency in forecasts. Default 1.0, [0.5, 2.0].
    pub demon_efficiency_adjust: f64,
    /// Default 14, [5, 30].
    pub rsi_period: usize,
    /// Default 12, [5, 30].
    pub macd_fast: usize,
    /// Default 26, [10, 50].
    pub macd_slow: usize,
    /// Short moving average. Default 20, [5, 60].
    pub sma_short_period: usize,
    /// Long moving average. Default 50, [20, 120].
    pub sma_long_period: usize,
    /// Default 30, [10, 40].
    pub rsi_oversold: f64,
    /// Default 70, [60, 90].
    pub rsi_overbought: f64,
    /// Default 1, [0.5, 5].
    pub signal_buy_threshold: f64,
    /// Default 2, [1, 10].
    pub signal_strong_buy_threshold: f64,
    /// Default 1, [0, 3].
    pub signal_rsi_weight: f64,
    /// Default 1, [0, 3].
    pub signal_macd_weight: f64,
    /// Default 1.5, [0, 3].
    pub signal_ma_weight: f64,
    /// Default 1, [0, 3].
    pub signal_trend_weight: f64,
    /// Histogram / kernel evaluation points. Default 10, [5, 20].
    pub entropy_bins: usize,
    /// Residual window for the forecast volatility seed. Default 6, [3, 12].
    pub information_flow_window: usize,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self::from_table(&toml::Table::new())
    }
}

impl ModelParams {
    pub fn from_table(table: &toml::Table) -> Self {
        Self {
            vol_decay: get_f64(table, "vol_decay", 0.9, 0.5, 0.99),
            momentum_factor: get_f64(table, "momentum_factor", 0.3, 0.0, 1.0),
            energy_barrier_factor: get_f64(table, "energy_barrier_factor", 0.01, 0.001, 0.1),
            demon_efficiency_adjust: get_f64(table, "demon_efficiency_adjust", 1.0, 0.5, 2.0),
            rsi_period: get_usize(table, "rsi_period", 14, 5, 30),
            macd_fast: get_usize(table, "macd_fast", 12, 5, 30),
            macd_slow: get_usize(table, "macd_slow", 26, 10, 50),
            sma_short_period: get_usize(table, "sma_short_period", 20, 5, 60),
            sma_long_period: get_usize(table, "sma_long_period", 50, 20, 120),
            rsi_oversold: get_usize(table, "rsi_oversold", 30, 10, 40) as f64,
            rsi_overbought: get_usize(table, "rsi_overbought", 70, 60, 90) as f64,
            signal_buy_threshold: get_f64(table, "signal_buy_threshold", 1.0, 0.5, 5.0),
            signal_strong_buy_threshold: get_f64(
                table,
                "signal_strong_buy_threshold",
                2.0,
                1.0,
                10.0,
            ),
            signal_rsi_weight: get_f64(table, "signal_rsi_weight", 1.0, 0.0, 3.0),
            signal_macd_weight: get_f64(table, "signal_macd_weight", 1.0, 0.0, 3.0),
            signal_ma_weight: get_f64(table, "signal_ma_weight", 1.5, 0.0, 3.0),
            signal_trend_weight: get_f64(table, "signal_trend_weight", 1.0, 0.0, 3.0),
            entropy_bins: get_usize(table, "entropy_bins", 10, 5, 20),
            information_flow_window: get_usize(table, "information_flow_window", 6, 3, 12),
        }
    }
}

fn numeric(table: &toml::Table, key: &str) -> Option<f64> {
    let value = table.get(key)?;
    value
        .as_float()
        .or_else(|| value.as_integer().map(|i| i as f64))
        .filter(|v| v.is_finite())
}

fn get_f64(table: &toml::Table, key: &str, default: f64, min: f64, max: f64) -> f64 {
    numeric(table, key).map_or(default, |v| v.clamp(min, max))
}

fn get_usize(table: &toml::Table, key: &str, default: usize, min: usize, max: usize) -> usize {
    numeric(table, key).map_or(default, |v| {
        let truncated = v.trunc().clamp(min as f64, max as f64);
        truncated as usize
    })
}
