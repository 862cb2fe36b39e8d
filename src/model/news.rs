use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: String,
    pub source: String,
    pub summary: String,
    pub url: String,
    /// Unix seconds.
    pub datetime: i64,
}
