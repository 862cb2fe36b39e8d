//! HTTP and WebSocket delivery for dashboard state.

mod routes;
mod ws;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use thiserror::Error;
use tokio::sync::{broadcast, watch};

use crate::dashboard::DashboardService;
use crate::event::PushEvent;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DashboardService>,
    pub events: broadcast::Sender<PushEvent>,
    pub shutdown: watch::Receiver<bool>,
    pub environment: String,
}

impl AppState {
    pub fn new(
        service: Arc<DashboardService>,
        events: broadcast::Sender<PushEvent>,
        shutdown: watch::Receiver<bool>,
        environment: &str,
    ) -> Self {
        Self {
            service,
            events,
            shutdown,
            environment: environment.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// `public` is always sent; `detail` is logged, and only sent outside production.
    #[error("{public}: {detail}")]
    Internal {
        public: String,
        detail: String,
        expose_detail: bool,
    },
}

impl ApiError {
    pub fn internal(environment: &str, public: &str, detail: impl ToString) -> Self {
        Self::Internal {
            public: public.to_string(),
            detail: detail.to_string(),
            expose_detail: !environment.eq_ignore_ascii_case("production"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            Self::Internal {
                public,
                detail,
                expose_detail,
            } => {
                tracing::error!(error = %detail, "{}", public);
                let body = if expose_detail {
                    json!({ "success": false, "error": public, "detail": detail })
                } else {
                    json!({ "success": false, "error": public })
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/signals", get(routes::signals))
        .route("/api/experts", get(routes::experts))
        .route("/api/portfolio", get(routes::portfolio))
        .route("/api/quote/{symbol}", get(routes::quote))
        .route("/api/news/{symbol}", get(routes::news))
        .route("/api/generate-signals", get(routes::generate_signals))
        .route("/ws", get(ws::ws_handler))
        .fallback(routes::not_found)
        .with_state(state)
}

/// Bind and serve until `shutdown` flips to `true`.
pub async fn start_server(
    state: AppState,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let mut shutdown = state.shutdown.clone();
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow_and_update() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(err: ApiError) -> (StatusCode, Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn internal_error_hides_detail_in_production() {
        let (status, body) =
            body_json(ApiError::internal("production", "Failed to generate signals", "task panicked")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Failed to generate signals");
        assert!(body.get("detail").is_none());
    }

    #[tokio::test]
    async fn internal_error_shows_detail_in_development() {
        let (status, body) =
            body_json(ApiError::internal("development", "Failed to generate signals", "task panicked")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to generate signals");
        assert_eq!(body["detail"], "task panicked");
    }

    #[tokio::test]
    async fn bad_request_is_400() {
        let (status, body) = body_json(ApiError::BadRequest("nope".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "nope");
    }
}
