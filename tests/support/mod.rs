#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use tradesafe::clock::ManualClock;
use tradesafe::dashboard::{DashboardService, DashboardSettings};
use tradesafe::error::AppError;
use tradesafe::market_data::{MarketDataClient, MarketDataSource};
use tradesafe::model::news::NewsItem;
use tradesafe::model::profile::CompanyProfile;
use tradesafe::model::quote::Quote;

/// What the scripted upstream does for one symbol's quote.
#[derive(Debug, Clone)]
pub enum Script {
    Quote(Quote),
    NoData,
    Status(u16),
    Hang,
}

/// In-memory upstream with per-symbol behaviour. Unscripted symbols get `NoData`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    pub configured: bool,
    pub quotes: HashMap<String, Script>,
}

impl ScriptedSource {
    pub fn configured() -> Self {
        Self {
            configured: true,
            quotes: HashMap::new(),
        }
    }

    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn with(mut self, symbol: &str, script: Script) -> Self {
        self.quotes.insert(symbol.to_string(), script);
        self
    }

    pub fn with_quote(self, symbol: &str, current: f64, previous_close: f64) -> Self {
        self.with(symbol, Script::Quote(Quote::from_prices(current, previous_close)))
    }
}

#[async_trait]
impl MarketDataSource for ScriptedSource {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, AppError> {
        match self.quotes.get(symbol).cloned().unwrap_or(Script::NoData) {
            Script::Quote(q) => Ok(q),
            Script::NoData => Err(AppError::NoData(symbol.to_string())),
            Script::Status(status) => Err(AppError::FinnhubApi {
                status,
                body: "scripted failure".to_string(),
            }),
            Script::Hang => std::future::pending().await,
        }
    }

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, AppError> {
        Ok(CompanyProfile {
            name: format!("{} Live Corp", symbol),
            exchange: "NYSE".to_string(),
        })
    }

    async fn company_news(
        &self,
        symbol: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<NewsItem>, AppError> {
        Ok(vec![NewsItem {
            headline: format!("{} beats estimates", symbol),
            source: "Scripted".to_string(),
            summary: String::new(),
            url: "https://example.com/news".to_string(),
            datetime: 1_700_000_000,
        }])
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap()
}

pub fn settings(watchlist: &[&str], symbols_per_batch: usize, max_signals: usize) -> DashboardSettings {
    DashboardSettings {
        watchlist: watchlist.iter().map(|s| s.to_string()).collect(),
        symbols_per_batch,
        max_signals,
        ..DashboardSettings::default()
    }
}

pub fn market_client(source: ScriptedSource, seed: u64) -> MarketDataClient {
    MarketDataClient::new(
        Arc::new(source),
        Duration::from_millis(500),
        StdRng::seed_from_u64(seed),
    )
}

pub fn service_with(
    source: ScriptedSource,
    clock: Arc<ManualClock>,
    settings: DashboardSettings,
    seed: u64,
) -> DashboardService {
    DashboardService::new(
        market_client(source, seed),
        clock,
        StdRng::seed_from_u64(seed.wrapping_add(1)),
        settings,
    )
}
