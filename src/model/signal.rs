use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    /// A flat move (exactly 0%) is classified as `Down`.
    pub fn from_change_pct(change_pct: f64) -> Self {
        if change_pct > 0.0 {
            Trend::Up
        } else {
            Trend::Down
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Scale applied to the level offsets around the current price.
    pub fn multiplier(self) -> f64 {
        match self {
            RiskTier::Low => 0.5,
            RiskTier::Medium => 1.0,
            RiskTier::High => 1.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry zone, rendered as `"low - high"` with two decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryRange {
    pub low: f64,
    pub high: f64,
}

impl fmt::Display for EntryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} - {:.2}", self.low, self.high)
    }
}

impl Serialize for EntryRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub id: Uuid,
    pub symbol: String,
    pub asset: String,
    pub trend: Trend,
    pub expert: String,
    pub risk: RiskTier,
    pub entry: EntryRange,
    pub target: f64,
    pub stop_loss: f64,
    pub current_price: f64,
    pub price_change: f64,
    pub timestamp: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
}

impl Signal {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry > now
    }
}

/// Round a display value to cents.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
