use chrono::{DateTime, Utc};
use rand::Rng;

use crate::model::portfolio::PortfolioSnapshot;

/// Cosmetic random walk over the dashboard's portfolio summary.
#[derive(Debug, Clone)]
pub struct PortfolioSimulator {
    snapshot: PortfolioSnapshot,
    value_floor: f64,
    max_value_step: f64,
}

impl PortfolioSimulator {
    pub fn new(initial: PortfolioSnapshot, value_floor: f64, max_value_step: f64) -> Self {
        Self {
            snapshot: initial,
            value_floor,
            max_value_step: max_value_step.abs().max(f64::EPSILON),
        }
    }

    pub fn snapshot(&self) -> &PortfolioSnapshot {
        &self.snapshot
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) -> PortfolioSnapshot {
        let change = rng.gen_range(-self.max_value_step..self.max_value_step);
        let s = &mut self.snapshot;
        s.portfolio_value = (s.portfolio_value + change).max(self.value_floor);
        s.daily_profit += change;
        s.open_trades = 6 + rng.gen_range(0..5);
        s.win_rate = 70 + rng.gen_range(0..15);
        s.risk_ratio = 1.2 + rng.gen_range(0.0..0.8);
        s.last_update = now;
        s.clone()
    }
}
