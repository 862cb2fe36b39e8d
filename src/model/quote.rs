use serde::{Deserialize, Serialize};

/// Point-in-time quote for one symbol. Serialized with the upstream short keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(rename = "c")]
    pub current: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "pc")]
    pub previous_close: f64,
    #[serde(rename = "d")]
    pub change: f64,
    #[serde(rename = "dp")]
    pub percent_change: f64,
}

impl Quote {
    /// Build a flat quote from a current price and previous close.
    pub fn from_prices(current: f64, previous_close: f64) -> Self {
        let change = current - previous_close;
        let percent_change = if previous_close != 0.0 {
            change / previous_close * 100.0
        } else {
            0.0
        };
        Self {
            current,
            high: current.max(previous_close),
            low: current.min(previous_close),
            open: previous_close,
            previous_close,
            change,
            percent_change,
        }
    }

    /// Percent move from the previous close, `None` when it cannot be computed.
    pub fn price_change_pct(&self) -> Option<f64> {
        if !self.current.is_finite() || !self.previous_close.is_finite() {
            return None;
        }
        if self.previous_close <= 0.0 {
            return None;
        }
        Some((self.current - self.previous_close) / self.previous_close * 100.0)
    }
}
