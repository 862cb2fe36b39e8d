use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::market_data::{DataSource, FallbackReason};
use crate::model::expert::Expert;
use crate::model::news::NewsItem;
use crate::model::portfolio::PortfolioSnapshot;
use crate::model::quote::Quote;
use crate::model::signal::Signal;

use super::{ApiError, AppState};

const DEFAULT_NEWS_LOOKBACK_DAYS: i64 = 7;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub environment: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub finnhub: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        environment: state.environment.clone(),
        timestamp: Utc::now(),
        finnhub: if state.service.is_market_data_configured() {
            "Configured"
        } else {
            "Not Configured - Using Mock Data"
        },
    })
}

pub async fn signals(State(state): State<AppState>) -> Json<Vec<Signal>> {
    Json(state.service.list_active_signals().await)
}

pub async fn experts(State(state): State<AppState>) -> Json<Vec<Expert>> {
    Json(state.service.list_experts().to_vec())
}

pub async fn portfolio(State(state): State<AppState>) -> Json<PortfolioSnapshot> {
    Json(state.service.current_portfolio().await)
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub symbol: String,
    #[serde(flatten)]
    pub quote: Quote,
    pub source: DataSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FallbackReason>,
}

pub async fn quote(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let symbol = symbol.trim().to_ascii_uppercase();
    if symbol.is_empty() {
        return Err(ApiError::BadRequest("symbol must not be empty".to_string()));
    }
    let outcome = state.service.live_quote(&symbol).await;
    Ok(Json(QuoteResponse {
        symbol,
        source: outcome.source(),
        reason: outcome.reason(),
        quote: outcome.into_value(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub symbol: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub source: DataSource,
    pub items: Vec<NewsItem>,
}

pub async fn news(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<NewsQuery>,
) -> Result<Json<NewsResponse>, ApiError> {
    let symbol = symbol.trim().to_ascii_uppercase();
    let to = params.to.unwrap_or_else(|| Utc::now().date_naive());
    let from = match params.from {
        Some(from) => from,
        None => to
            .checked_sub_signed(Duration::days(DEFAULT_NEWS_LOOKBACK_DAYS))
            .ok_or_else(|| ApiError::BadRequest(format!("to ({}) is out of range", to)))?,
    };
    if from > to {
        return Err(ApiError::BadRequest(format!(
            "from ({}) must not be after to ({})",
            from, to
        )));
    }
    let outcome = state.service.company_news(&symbol, from, to).await;
    Ok(Json(NewsResponse {
        symbol,
        from,
        to,
        source: outcome.source(),
        items: outcome.into_value(),
    }))
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub signals: Vec<Signal>,
    pub message: String,
}

pub async fn generate_signals(
    State(state): State<AppState>,
) -> Result<Json<GenerateResponse>, ApiError> {
    // The batch runs to completion even if the client disconnects.
    let service = state.service.clone();
    let signals = tokio::spawn(async move { service.generate().await })
        .await
        .map_err(|e| ApiError::internal(&state.environment, "Failed to generate signals", e))?;
    Ok(Json(GenerateResponse {
        success: true,
        message: format!("Generated {} new signals", signals.len()),
        signals,
    }))
}

pub async fn not_found(uri: Uri) -> Response {
    if uri.path().starts_with("/api/") || uri.path() == "/api" {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "API route not found" })),
        )
            .into_response()
    } else {
        (StatusCode::NOT_FOUND, "Not Found").into_response()
    }
}
