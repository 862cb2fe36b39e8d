use serde::Deserialize;

use crate::model::news::NewsItem;
use crate::model::profile::CompanyProfile;
use crate::model::quote::Quote;

/// Finnhub sends `null` for change fields on unknown symbols; treat as 0.
pub fn number_or_null_to_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    match v {
        serde_json::Value::Null => Ok(0.0),
        serde_json::Value::String(s) => s.parse::<f64>().map_err(serde::de::Error::custom),
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("invalid number")),
        _ => Err(serde::de::Error::custom("invalid numeric value")),
    }
}

/// GET /quote
#[derive(Debug, Deserialize)]
pub struct FinnhubQuoteResponse {
    #[serde(default, deserialize_with = "number_or_null_to_f64")]
    pub c: f64,
    #[serde(default, deserialize_with = "number_or_null_to_f64")]
    pub h: f64,
    #[serde(default, deserialize_with = "number_or_null_to_f64")]
    pub l: f64,
    #[serde(default, deserialize_with = "number_or_null_to_f64")]
    pub o: f64,
    #[serde(default, deserialize_with = "number_or_null_to_f64")]
    pub pc: f64,
    #[serde(default, deserialize_with = "number_or_null_to_f64")]
    pub d: f64,
    #[serde(default, deserialize_with = "number_or_null_to_f64")]
    pub dp: f64,
}

impl FinnhubQuoteResponse {
    /// Finnhub answers unknown symbols with an all-zero quote.
    pub fn has_data(&self) -> bool {
        self.c != 0.0
    }
}

impl From<FinnhubQuoteResponse> for Quote {
    fn from(r: FinnhubQuoteResponse) -> Self {
        Quote {
            current: r.c,
            high: r.h,
            low: r.l,
            open: r.o,
            previous_close: r.pc,
            change: r.d,
            percent_change: r.dp,
        }
    }
}

/// GET /stock/profile2. Unknown symbols come back as `{}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinnhubProfileResponse {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub exchange: String,
    #[serde(default)]
    pub ticker: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub finnhub_industry: String,
}

impl FinnhubProfileResponse {
    pub fn has_data(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

impl From<FinnhubProfileResponse> for CompanyProfile {
    fn from(r: FinnhubProfileResponse) -> Self {
        CompanyProfile {
            name: r.name,
            exchange: if r.exchange.trim().is_empty() {
                "Unknown".to_string()
            } else {
                r.exchange
            },
        }
    }
}

/// One item of GET /company-news.
#[derive(Debug, Deserialize)]
pub struct FinnhubNewsItem {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub datetime: i64,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub related: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub url: String,
}

impl From<FinnhubNewsItem> for NewsItem {
    fn from(r: FinnhubNewsItem) -> Self {
        NewsItem {
            headline: r.headline,
            source: r.source,
            summary: r.summary,
            url: r.url,
            datetime: r.datetime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_with_null_changes_parses_as_no_data() {
        let body = r#"{"c":0,"d":null,"dp":null,"h":0,"l":0,"o":0,"pc":0,"t":0}"#;
        let parsed: FinnhubQuoteResponse = serde_json::from_str(body).unwrap();
        assert!(!parsed.has_data());
        assert_eq!(parsed.d, 0.0);
    }

    #[test]
    fn quote_maps_short_keys() {
        let body = r#"{"c":261.74,"d":-1.02,"dp":-0.3882,"h":263.31,"l":260.68,"o":261.07,"pc":262.76,"t":1582641000}"#;
        let quote: Quote = serde_json::from_str::<FinnhubQuoteResponse>(body).unwrap().into();
        assert_eq!(quote.current, 261.74);
        assert_eq!(quote.previous_close, 262.76);
        assert_eq!(quote.percent_change, -0.3882);
    }

    #[test]
    fn empty_profile_has_no_data() {
        let parsed: FinnhubProfileResponse = serde_json::from_str("{}").unwrap();
        assert!(!parsed.has_data());
    }
}
