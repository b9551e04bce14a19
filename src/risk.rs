use serde::Serialize;

use crate::settings::RiskSettings;

const MIN_SHARES: f64 = 1.0;
const MAX_SHARES: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskRewardRating {
    Excellent,
    Good,
    Poor,
}

impl RiskRewardRating {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 2.0 {
            Self::Excellent
        } else if ratio >= 1.0 {
            Self::Good
        } else {
            Self::Poor
        }
    }
}

/// Exit levels and position size for a single entry.
#[derive(Debug, Clone, Serialize)]
pub struct RiskPlan {
    pub entry_price: f64,
    pub stop_loss_price: f64,
    pub stop_loss_distance: f64,
    pub take_profit_price: f64,
    pub take_profit_distance: f64,
    pub recommended_shares: u32,
    /// `0.0` when the stop-loss distance is zero.
    pub position_value: f64,
    pub risk_reward_ratio: f64,
    pub rating: RiskRewardRating,
}

/// Plan a position entered at `buy_price`, or at `current_price` without
/// one.
pub fn plan(current_price: f64, buy_price: Option<f64>, settings: RiskSettings) -> RiskPlan {
    let entry_price = buy_price.filter(|p| *p > 0.0).unwrap_or(current_price);

    let stop_loss_price = entry_price * (1.0 - settings.stop_loss_percent / 100.0);
    let stop_loss_distance = entry_price - stop_loss_price;
    let take_profit_price = entry_price * (1.0 + settings.take_profit_percent / 100.0);
    let take_profit_distance = take_profit_price - entry_price;

    let (recommended_shares, position_value) = if stop_loss_distance > 0.0 {
        let max_loss = entry_price * settings.risk_percent / 100.0;
        let shares = (max_loss / stop_loss_distance).floor().clamp(MIN_SHARES, MAX_SHARES);
        (shares as u32, entry_price * shares)
    } else {
        (1, 0.0)
    };

    let risk_reward_ratio = if stop_loss_distance > 0.0 {
        take_profit_distance / stop_loss_distance
    } else {
        0.0
    };

    RiskPlan {
        entry_price,
        stop_loss_price,
        stop_loss_distance,
        take_profit_price,
        take_profit_distance,
        recommended_shares,
        position_value,
        risk_reward_ratio,
        rating: RiskRewardRating::from_ratio(risk_reward_ratio),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfitLoss {
    pub amount: f64,
    pub percent: f64,
}

impl ProfitLoss {
    fn at(buy_price: f64, shares: f64, price: f64) -> Self {
        Self {
            amount: (price - buy_price) * shares,
            percent: (price - buy_price) / buy_price * 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfitProjection {
    pub buy_price: f64,
    pub shares: f64,
    pub cost: f64,
    pub current: ProfitLoss,
    pub predicted: Option<ProfitLoss>,
}

/// Holding P&L; `None` unless both the buy price and share count are
/// positive.
pub fn project_profit(
    buy_price: Option<f64>,
    shares: f64,
    current_price: f64,
    predicted_price: Option<f64>,
) -> Option<ProfitProjection> {
    let buy_price = buy_price.filter(|p| *p > 0.0)?;
    if shares <= 0.0 {
        return None;
    }
    Some(ProfitProjection {
        buy_price,
        shares,
        cost: buy_price * shares,
        current: ProfitLoss::at(buy_price, shares, current_price),
        predicted: predicted_price.map(|p| ProfitLoss::at(buy_price, shares, p)),
    })
}
