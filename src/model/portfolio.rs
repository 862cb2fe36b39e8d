use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub portfolio_value: f64,
    pub daily_profit: f64,
    pub open_trades: u32,
    pub win_rate: u32,
    pub risk_ratio: f64,
    pub last_update: DateTime<Utc>,
}

impl PortfolioSnapshot {
    /// Seed snapshot shown before the first simulated tick.
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            portfolio_value: 12_458.75,
            daily_profit: 245.60,
            open_trades: 8,
            win_rate: 73,
            risk_ratio: 1.4,
            last_update: now,
        }
    }
}
