use serde::Serialize;

use crate::model::portfolio::PortfolioSnapshot;
use crate::model::signal::Signal;

/// Messages fanned out over the push channel as `{"event": .., "data": ..}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum PushEvent {
    /// Active signals, sent once on connect.
    #[serde(rename = "signals")]
    Signals(Vec<Signal>),
    /// Portfolio snapshot, sent once on connect.
    #[serde(rename = "portfolio")]
    Portfolio(PortfolioSnapshot),
    #[serde(rename = "new-signals")]
    NewSignals(Vec<Signal>),
    #[serde(rename = "portfolio-update")]
    PortfolioUpdate(PortfolioSnapshot),
}

impl PushEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Signals(_) => "signals",
            Self::Portfolio(_) => "portfolio",
            Self::NewSignals(_) => "new-signals",
            Self::PortfolioUpdate(_) => "portfolio-update",
        }
    }
}
