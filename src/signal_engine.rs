use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::SignalsConfig;
use crate::error::SignalError;
use crate::model::expert::Expert;
use crate::model::profile::CompanyProfile;
use crate::model::quote::Quote;
use crate::model::signal::{round2, EntryRange, RiskTier, Signal, Trend};

/// Thresholds and expiry window used when deriving signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalPolicy {
    /// `|change| < low` is low risk.
    pub low_risk_threshold_pct: f64,
    /// `|change| > high` is high risk.
    pub high_risk_threshold_pct: f64,
    pub expiry_min_days: u32,
    pub expiry_max_days: u32,
}

impl Default for SignalPolicy {
    fn default() -> Self {
        Self {
            low_risk_threshold_pct: 2.0,
            high_risk_threshold_pct: 5.0,
            expiry_min_days: 2,
            expiry_max_days: 4,
        }
    }
}

impl From<&SignalsConfig> for SignalPolicy {
    fn from(cfg: &SignalsConfig) -> Self {
        Self {
            low_risk_threshold_pct: cfg.low_risk_threshold_pct,
            high_risk_threshold_pct: cfg.high_risk_threshold_pct,
            expiry_min_days: cfg.expiry_min_days,
            expiry_max_days: cfg.expiry_max_days,
        }
    }
}

impl SignalPolicy {
    pub fn classify_risk(&self, change_pct: f64) -> RiskTier {
        let volatility = change_pct.abs();
        if volatility > self.high_risk_threshold_pct {
            RiskTier::High
        } else if volatility < self.low_risk_threshold_pct {
            RiskTier::Low
        } else {
            RiskTier::Medium
        }
    }

    fn expiry_days<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        let min = self.expiry_min_days.max(1);
        let max = self.expiry_max_days.max(min);
        i64::from(rng.gen_range(min..=max))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalLevels {
    pub entry: EntryRange,
    pub target: f64,
    pub stop_loss: f64,
}

/// Entry zone, target and stop-loss as offsets from `price`, rounded to cents.
pub fn calculate_levels(price: f64, trend: Trend, risk: RiskTier) -> SignalLevels {
    let m = risk.multiplier();
    let (entry_low, entry_high, target, stop_loss) = match trend {
        Trend::Up => (
            price * (1.0 - 0.01 * m),
            price * (1.0 - 0.005 * m),
            price * (1.0 + 0.08 * m),
            price * (1.0 - 0.04 * m),
        ),
        Trend::Down => (
            price * (1.0 + 0.005 * m),
            price * (1.0 + 0.01 * m),
            price * (1.0 - 0.08 * m),
            price * (1.0 + 0.04 * m),
        ),
    };
    SignalLevels {
        entry: EntryRange {
            low: round2(entry_low),
            high: round2(entry_high),
        },
        target: round2(target),
        stop_loss: round2(stop_loss),
    }
}

/// Turn a quote into a signal. Randomness picks the expert, the id and the expiry.
pub fn derive_signal<R: Rng + ?Sized>(
    symbol: &str,
    quote: &Quote,
    profile: &CompanyProfile,
    experts: &[Expert],
    policy: &SignalPolicy,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Signal, SignalError> {
    let change_pct = quote
        .price_change_pct()
        .ok_or_else(|| SignalError::InvalidQuote {
            symbol: symbol.to_string(),
            current: quote.current,
            previous_close: quote.previous_close,
        })?;
    let expert = experts.choose(rng).ok_or(SignalError::NoExperts)?;

    let trend = Trend::from_change_pct(change_pct);
    let risk = policy.classify_risk(change_pct);
    let levels = calculate_levels(quote.current, trend, risk);
    let expiry = now + Duration::days(policy.expiry_days(rng));

    Ok(Signal {
        id: uuid::Builder::from_random_bytes(rng.gen()).into_uuid(),
        symbol: symbol.to_string(),
        asset: format!("{} - {}", symbol, profile.name),
        trend,
        expert: expert.name.clone(),
        risk,
        entry: levels.entry,
        target: levels.target,
        stop_loss: levels.stop_loss,
        current_price: round2(quote.current),
        price_change: round2(change_pct),
        timestamp: now,
        expiry,
    })
}
