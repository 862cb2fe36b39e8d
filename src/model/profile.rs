use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub exchange: String,
}

const KNOWN_COMPANIES: &[(&str, &str, &str)] = &[
    ("AAPL", "Apple Inc.", "NASDAQ"),
    ("MSFT", "Microsoft Corporation", "NASDAQ"),
    ("GOOGL", "Alphabet Inc.", "NASDAQ"),
    ("TSLA", "Tesla Inc.", "NASDAQ"),
    ("AMZN", "Amazon.com Inc.", "NASDAQ"),
    ("META", "Meta Platforms Inc.", "NASDAQ"),
    ("NFLX", "Netflix Inc.", "NASDAQ"),
    ("NVDA", "NVIDIA Corporation", "NASDAQ"),
];

impl CompanyProfile {
    /// Static profile used when the upstream lookup is unavailable.
    pub fn fallback(symbol: &str) -> Self {
        let sym = symbol.trim().to_ascii_uppercase();
        KNOWN_COMPANIES
            .iter()
            .find(|(s, _, _)| *s == sym)
            .map(|(_, name, exchange)| Self {
                name: name.to_string(),
                exchange: exchange.to_string(),
            })
            .unwrap_or_else(|| Self {
                name: format!("{} Company", sym),
                exchange: "Unknown".to_string(),
            })
    }
}
