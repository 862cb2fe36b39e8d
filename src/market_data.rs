//! Upstream quote/profile/news access that never fails.
//!
//! Every call resolves to a [`FetchOutcome`]: either the live upstream value
//! or a synthesized stand-in tagged with the reason the live value was not
//! used.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;

use crate::error::AppError;
use crate::finnhub::rest::FinnhubRestClient;
use crate::model::news::NewsItem;
use crate::model::profile::CompanyProfile;
use crate::model::quote::Quote;

/// Raw upstream market data. Implementations may fail; [`MarketDataClient`]
/// absorbs those failures.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn quote(&self, symbol: &str) -> Result<Quote, AppError>;

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, AppError>;

    async fn company_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NewsItem>, AppError>;
}

#[async_trait]
impl MarketDataSource for FinnhubRestClient {
    fn is_configured(&self) -> bool {
        FinnhubRestClient::is_configured(self)
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, AppError> {
        FinnhubRestClient::quote(self, symbol).await
    }

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, AppError> {
        FinnhubRestClient::company_profile(self, symbol).await
    }

    async fn company_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NewsItem>, AppError> {
        FinnhubRestClient::company_news(self, symbol, from, to).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum FallbackReason {
    MissingCredentials,
    Timeout,
    Network,
    UpstreamStatus(u16),
    Decode,
    NoData,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredentials => f.write_str("api key not configured"),
            Self::Timeout => f.write_str("upstream timeout"),
            Self::Network => f.write_str("network error"),
            Self::UpstreamStatus(code) => write!(f, "upstream status {}", code),
            Self::Decode => f.write_str("undecodable upstream response"),
            Self::NoData => f.write_str("no data for symbol"),
        }
    }
}

impl FallbackReason {
    pub fn from_error(err: &AppError) -> Self {
        match err {
            AppError::MissingApiKey => Self::MissingCredentials,
            AppError::NoData(_) => Self::NoData,
            AppError::FinnhubApi { status, .. } => Self::UpstreamStatus(*status),
            AppError::Http(e) if e.is_timeout() => Self::Timeout,
            AppError::Http(e) if e.is_decode() => Self::Decode,
            AppError::Json(_) => Self::Decode,
            AppError::Http(_) | AppError::Io(_) | AppError::Config(_) => Self::Network,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Mock,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Live(T),
    Mock { value: T, reason: FallbackReason },
}

impl<T> FetchOutcome<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::Live(v) => v,
            Self::Mock { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Live(v) => v,
            Self::Mock { value, .. } => value,
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, Self::Mock { .. })
    }

    pub fn source(&self) -> DataSource {
        match self {
            Self::Live(_) => DataSource::Live,
            Self::Mock { .. } => DataSource::Mock,
        }
    }

    pub fn reason(&self) -> Option<FallbackReason> {
        match self {
            Self::Live(_) => None,
            Self::Mock { reason, .. } => Some(*reason),
        }
    }
}

/// Random walk around a base price in [100, 300).
pub fn mock_quote<R: Rng + ?Sized>(rng: &mut R) -> Quote {
    let base_price = rng.gen_range(100.0..300.0);
    let change = rng.gen_range(-5.0..5.0);
    let previous_close = base_price - change;
    Quote {
        current: base_price,
        high: base_price + rng.gen_range(0.0..5.0),
        low: base_price - rng.gen_range(0.0..5.0),
        open: previous_close,
        previous_close,
        change,
        percent_change: change / previous_close * 100.0,
    }
}

pub struct MarketDataClient {
    source: Arc<dyn MarketDataSource>,
    timeout: Duration,
    rng: Mutex<StdRng>,
}

impl MarketDataClient {
    pub fn new(source: Arc<dyn MarketDataSource>, timeout: Duration, rng: StdRng) -> Self {
        Self {
            source,
            timeout,
            rng: Mutex::new(rng),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.source.is_configured()
    }

    async fn fetch<T, F>(&self, what: &'static str, symbol: &str, fut: F) -> Result<T, FallbackReason>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        if !self.source.is_configured() {
            return Err(FallbackReason::MissingCredentials);
        }
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => {
                let reason = FallbackReason::from_error(&e);
                tracing::warn!(symbol, what, error = %e, reason = %reason, "Upstream fetch failed, using mock data");
                Err(reason)
            }
            Err(_) => {
                tracing::warn!(
                    symbol,
                    what,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Upstream fetch timed out, using mock data"
                );
                Err(FallbackReason::Timeout)
            }
        }
    }

    pub async fn fetch_quote(&self, symbol: &str) -> FetchOutcome<Quote> {
        match self.fetch("quote", symbol, self.source.quote(symbol)).await {
            Ok(quote) => FetchOutcome::Live(quote),
            Err(reason) => {
                let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                FetchOutcome::Mock {
                    value: mock_quote(&mut *rng),
                    reason,
                }
            }
        }
    }

    pub async fn fetch_profile(&self, symbol: &str) -> FetchOutcome<CompanyProfile> {
        match self
            .fetch("profile", symbol, self.source.company_profile(symbol))
            .await
        {
            Ok(profile) => FetchOutcome::Live(profile),
            Err(reason) => FetchOutcome::Mock {
                value: CompanyProfile::fallback(symbol),
                reason,
            },
        }
    }

    pub async fn fetch_company_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> FetchOutcome<Vec<NewsItem>> {
        match self
            .fetch("news", symbol, self.source.company_news(symbol, from, to))
            .await
        {
            Ok(items) => FetchOutcome::Live(items),
            Err(reason) => FetchOutcome::Mock {
                value: Vec::new(),
                reason,
            },
        }
    }
}
