use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::model::news::NewsItem;
use crate::model::profile::CompanyProfile;
use crate::model::quote::Quote;

use super::types::{FinnhubNewsItem, FinnhubProfileResponse, FinnhubQuoteResponse};

// Free tier allows 60 calls/min.
const RATE_WARN_PER_MINUTE: u64 = 48;

pub struct FinnhubRestClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    // Simple rate tracker: request count in current minute window
    request_count: AtomicU64,
    window_start: std::sync::Mutex<Instant>,
}

impl FinnhubRestClient {
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AppError::Http)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            request_count: AtomicU64::new(0),
            window_start: std::sync::Mutex::new(Instant::now()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn track_rate(&self) {
        let mut start = self.window_start.lock().unwrap_or_else(|e| e.into_inner());
        if start.elapsed().as_secs() >= 60 {
            *start = Instant::now();
            self.request_count.store(0, Ordering::Relaxed);
        }
        let count = self.request_count.fetch_add(1, Ordering::Relaxed);
        if count > RATE_WARN_PER_MINUTE {
            tracing::warn!(count, "Approaching finnhub rate limit (60/min)");
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let token = self.api_key.as_deref().ok_or(AppError::MissingApiKey)?;
        self.track_rate();

        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(path, "finnhub request");

        let resp = self
            .http
            .get(&url)
            .query(params)
            .query(&[("token", token)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::FinnhubApi {
                status: status.as_u16(),
                body: compact_error_body(&body),
            });
        }

        Ok(resp.json::<T>().await?)
    }

    pub async fn quote(&self, symbol: &str) -> Result<Quote, AppError> {
        let resp: FinnhubQuoteResponse = self.get_json("/quote", &[("symbol", symbol)]).await?;
        if !resp.has_data() {
            return Err(AppError::NoData(symbol.to_string()));
        }
        Ok(resp.into())
    }

    pub async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, AppError> {
        let resp: FinnhubProfileResponse = self
            .get_json("/stock/profile2", &[("symbol", symbol)])
            .await?;
        if !resp.has_data() {
            return Err(AppError::NoData(symbol.to_string()));
        }
        Ok(resp.into())
    }

    pub async fn company_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NewsItem>, AppError> {
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();
        let items: Vec<FinnhubNewsItem> = self
            .get_json(
                "/company-news",
                &[("symbol", symbol), ("from", from.as_str()), ("to", to.as_str())],
            )
            .await?;
        Ok(items.into_iter().map(NewsItem::from).collect())
    }
}

fn compact_error_body(body: &str) -> String {
    let normalized = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.chars().count() > 180 {
        format!("{}...", normalized.chars().take(180).collect::<String>())
    } else {
        normalized
    }
}
