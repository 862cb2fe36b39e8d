use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use futures_util::future::join_all;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::sync::RwLock;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{AppError, SignalError};
use crate::finnhub::rest::FinnhubRestClient;
use crate::market_data::{FetchOutcome, MarketDataClient};
use crate::model::expert::{default_roster, Expert};
use crate::model::news::NewsItem;
use crate::model::portfolio::PortfolioSnapshot;
use crate::model::quote::Quote;
use crate::model::signal::Signal;
use crate::portfolio::PortfolioSimulator;
use crate::signal_engine::{derive_signal, SignalPolicy};

#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub watchlist: Vec<String>,
    pub symbols_per_batch: usize,
    pub max_signals: usize,
    pub policy: SignalPolicy,
    pub value_floor: f64,
    pub max_value_step: f64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            watchlist: ["AAPL", "MSFT", "GOOGL", "TSLA", "AMZN", "META", "NFLX", "NVDA"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            symbols_per_batch: 2,
            max_signals: 8,
            policy: SignalPolicy::default(),
            value_floor: 10_000.0,
            max_value_step: 50.0,
        }
    }
}

impl DashboardSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            watchlist: config.signals.watchlist_symbols(),
            symbols_per_batch: config.signals.symbols_per_batch,
            max_signals: config.signals.max_signals,
            policy: SignalPolicy::from(&config.signals),
            value_floor: config.portfolio.value_floor,
            max_value_step: config.portfolio.max_value_step,
        }
    }
}

/// Owner of all dashboard state: the retained signal list (newest first),
/// the simulated portfolio and the expert roster.
pub struct DashboardService {
    market: MarketDataClient,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
    experts: Vec<Expert>,
    watchlist: Vec<String>,
    symbols_per_batch: usize,
    max_signals: usize,
    policy: SignalPolicy,
    signals: RwLock<Vec<Signal>>,
    portfolio: RwLock<PortfolioSimulator>,
    // Serializes generation runs so their read-modify-write of `signals` never interleaves.
    generation: tokio::sync::Mutex<()>,
}

impl DashboardService {
    pub fn new(
        market: MarketDataClient,
        clock: Arc<dyn Clock>,
        rng: StdRng,
        settings: DashboardSettings,
    ) -> Self {
        let now = clock.now();
        Self {
            market,
            clock,
            rng: Mutex::new(rng),
            experts: default_roster(),
            watchlist: settings.watchlist,
            symbols_per_batch: settings.symbols_per_batch.max(1),
            max_signals: settings.max_signals.max(1),
            policy: settings.policy,
            signals: RwLock::new(Vec::new()),
            portfolio: RwLock::new(PortfolioSimulator::new(
                PortfolioSnapshot::initial(now),
                settings.value_floor,
                settings.max_value_step,
            )),
            generation: tokio::sync::Mutex::new(()),
        }
    }

    /// Production wiring: Finnhub upstream, system clock, seeded or entropy RNG.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let rest = FinnhubRestClient::new(
            &config.finnhub.base_url,
            config.finnhub.api_key.as_deref(),
            config.finnhub.timeout(),
        )?;
        let (market_rng, engine_rng) = match config.signals.rng_seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (StdRng::from_entropy(), StdRng::from_entropy()),
        };
        let market = MarketDataClient::new(Arc::new(rest), config.finnhub.timeout(), market_rng);
        Ok(Self::new(
            market,
            Arc::new(SystemClock),
            engine_rng,
            DashboardSettings::from_config(config),
        ))
    }

    pub fn with_experts(mut self, experts: Vec<Expert>) -> Self {
        self.experts = experts;
        self
    }

    pub fn is_market_data_configured(&self) -> bool {
        self.market.is_configured()
    }

    pub fn watchlist(&self) -> &[String] {
        &self.watchlist
    }

    fn pick_symbols(&self, count: usize) -> Vec<String> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        self.watchlist
            .choose_multiple(&mut *rng, count)
            .cloned()
            .collect()
    }

    /// Generate signals for a random batch of watchlist symbols.
    pub async fn generate(&self) -> Vec<Signal> {
        let symbols = self.pick_symbols(self.symbols_per_batch);
        self.generate_for(&symbols).await
    }

    /// Generate one signal per watchlist symbol.
    pub async fn generate_for_watchlist(&self) -> Vec<Signal> {
        let symbols = self.watchlist.clone();
        self.generate_for(&symbols).await
    }

    /// Fetch and derive concurrently; symbols that fail are logged and skipped.
    pub async fn generate_for(&self, symbols: &[String]) -> Vec<Signal> {
        let _running = self.generation.lock().await;

        let results = join_all(symbols.iter().map(|s| self.signal_for_symbol(s))).await;
        let mut fresh = Vec::with_capacity(results.len());
        for (symbol, result) in symbols.iter().zip(results) {
            match result {
                Ok(signal) => fresh.push(signal),
                Err(e) => {
                    tracing::warn!(symbol = %symbol, error = %e, "Skipping symbol, signal derivation failed");
                }
            }
        }

        self.insert_signals(fresh.clone()).await;
        tracing::info!(
            generated = fresh.len(),
            requested = symbols.len(),
            "Generated trading signals"
        );
        fresh
    }

    async fn signal_for_symbol(&self, symbol: &str) -> Result<Signal, SignalError> {
        let (quote, profile) = tokio::join!(
            self.market.fetch_quote(symbol),
            self.market.fetch_profile(symbol)
        );
        if let Some(reason) = quote.reason() {
            tracing::debug!(symbol, reason = %reason, "Deriving signal from mock quote");
        }

        let now = self.clock.now();
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        derive_signal(
            symbol,
            quote.value(),
            profile.value(),
            &self.experts,
            &self.policy,
            now,
            &mut *rng,
        )
    }

    /// Prepend `fresh` (kept in its given order) and evict the oldest beyond the cap.
    pub async fn insert_signals(&self, fresh: Vec<Signal>) {
        if fresh.is_empty() {
            return;
        }
        let mut signals = self.signals.write().await;
        let mut next = fresh;
        next.append(&mut signals);
        next.truncate(self.max_signals);
        *signals = next;
    }

    /// Run `rounds` generation batches, used to seed the list at startup.
    pub async fn warm_up(&self, rounds: usize) -> usize {
        let mut total = 0;
        for _ in 0..rounds {
            total += self.generate().await.len();
        }
        tracing::info!(rounds, total, "Initial signals generated");
        total
    }

    /// Retained signals whose expiry is still in the future, newest first.
    pub async fn list_active_signals(&self) -> Vec<Signal> {
        let now = self.clock.now();
        self.signals
            .read()
            .await
            .iter()
            .filter(|s| s.is_active_at(now))
            .cloned()
            .collect()
    }

    /// Everything retained, expired or not.
    pub async fn retained_signals(&self) -> Vec<Signal> {
        self.signals.read().await.clone()
    }

    pub fn list_experts(&self) -> &[Expert] {
        &self.experts
    }

    pub async fn current_portfolio(&self) -> PortfolioSnapshot {
        self.portfolio.read().await.snapshot().clone()
    }

    pub async fn tick_portfolio(&self) -> PortfolioSnapshot {
        let now = self.clock.now();
        let mut sim = self.portfolio.write().await;
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        sim.tick(now, &mut *rng)
    }

    pub async fn live_quote(&self, symbol: &str) -> FetchOutcome<Quote> {
        let symbol = symbol.trim().to_ascii_uppercase();
        self.market.fetch_quote(&symbol).await
    }

    pub async fn company_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> FetchOutcome<Vec<NewsItem>> {
        let symbol = symbol.trim().to_ascii_uppercase();
        self.market.fetch_company_news(&symbol, from, to).await
    }
}
