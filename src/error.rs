use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("finnhub API key not configured")]
    MissingApiKey,

    #[error("finnhub API error (status {status}): {body}")]
    FinnhubApi { status: u16, body: String },

    #[error("finnhub returned no data for {0}")]
    NoData(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a single symbol cannot be turned into a signal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    #[error("invalid quote for {symbol}: current={current}, previous_close={previous_close}")]
    InvalidQuote {
        symbol: String,
        current: f64,
        previous_close: f64,
    },

    #[error("expert roster is empty")]
    NoExperts,
}
