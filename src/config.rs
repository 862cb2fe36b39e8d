use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub finnhub: FinnhubConfig,
    pub signals: SignalsConfig,
    pub portfolio: PortfolioConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinnhubConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Empty means no key: every fetch falls back to mock data.
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalsConfig {
    pub watchlist: Vec<String>,
    pub symbols_per_batch: usize,
    pub max_signals: usize,
    #[serde(default)]
    pub initial_batches: usize,
    pub low_risk_threshold_pct: f64,
    pub high_risk_threshold_pct: f64,
    pub expiry_min_days: u32,
    pub expiry_max_days: u32,
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioConfig {
    pub value_floor: f64,
    pub max_value_step: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    pub signal_interval: String,
    pub portfolio_interval: String,
    pub heartbeat_interval: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Parse an interval string (e.g. "30s", "3m", "1h", "1d", "1w", "1M") into milliseconds.
pub fn parse_interval_ms(s: &str) -> Result<u64> {
    let (num_str, suffix) = match s.char_indices().last() {
        Some((idx, _)) if idx > 0 => s.split_at(idx),
        _ => bail!("invalid interval '{}': expected format like '3m'", s),
    };
    let n: u64 = num_str.parse().with_context(|| {
        format!(
            "invalid interval '{}': quantity must be a positive integer",
            s
        )
    })?;
    if n == 0 {
        bail!("invalid interval '{}': quantity must be > 0", s);
    }

    let unit_ms = match suffix {
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        "w" => 7 * 86_400_000,
        "M" => 30 * 86_400_000,
        _ => bail!(
            "invalid interval '{}': unsupported suffix '{}', expected one of s/m/h/d/w/M",
            s,
            suffix
        ),
    };

    n.checked_mul(unit_ms)
        .with_context(|| format!("invalid interval '{}': value is too large", s))
}

impl FinnhubConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

impl SignalsConfig {
    /// Upper-cased, trimmed, de-duplicated watchlist in configured order.
    pub fn watchlist_symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for sym in &self.watchlist {
            let s = sym.trim().to_ascii_uppercase();
            if !s.is_empty() && !out.iter().any(|v| v == &s) {
                out.push(s);
            }
        }
        out
    }
}

impl SchedulerConfig {
    pub fn signal_interval(&self) -> Result<Duration> {
        parse_interval_ms(&self.signal_interval).map(Duration::from_millis)
    }

    pub fn portfolio_interval(&self) -> Result<Duration> {
        parse_interval_ms(&self.portfolio_interval).map(Duration::from_millis)
    }

    pub fn heartbeat_interval(&self) -> Result<Duration> {
        parse_interval_ms(&self.heartbeat_interval).map(Duration::from_millis)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_path = std::env::var("TRADESAFE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut config = Self::from_path(&config_path)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&config_str)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("invalid config toml")
    }

    fn apply_env(&mut self) -> Result<()> {
        self.finnhub.api_key = std::env::var("FINNHUB_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT '{}' is not a valid port", port))?;
        }
        if let Ok(env) = std::env::var("APP_ENV") {
            if !env.trim().is_empty() {
                self.server.environment = env.trim().to_string();
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let signals = &self.signals;
        if signals.watchlist_symbols().is_empty() {
            bail!("signals.watchlist must contain at least one symbol");
        }
        if signals.symbols_per_batch == 0 {
            bail!("signals.symbols_per_batch must be > 0");
        }
        if signals.max_signals == 0 {
            bail!("signals.max_signals must be > 0");
        }
        if !(signals.low_risk_threshold_pct >= 0.0
            && signals.low_risk_threshold_pct <= signals.high_risk_threshold_pct)
        {
            bail!(
                "signals risk thresholds must satisfy 0 <= low ({}) <= high ({})",
                signals.low_risk_threshold_pct,
                signals.high_risk_threshold_pct
            );
        }
        if signals.expiry_min_days == 0 || signals.expiry_min_days > signals.expiry_max_days {
            bail!(
                "signals expiry window must satisfy 1 <= min ({}) <= max ({})",
                signals.expiry_min_days,
                signals.expiry_max_days
            );
        }
        if self.portfolio.max_value_step <= 0.0 {
            bail!("portfolio.max_value_step must be > 0");
        }
        self.scheduler
            .signal_interval()
            .context("scheduler.signal_interval is invalid")?;
        self.scheduler
            .portfolio_interval()
            .context("scheduler.portfolio_interval is invalid")?;
        self.scheduler
            .heartbeat_interval()
            .context("scheduler.heartbeat_interval is invalid")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[server]
port = 3000
environment = "development"

[finnhub]
base_url = "https://finnhub.io/api/v1"
timeout_ms = 10000

[signals]
watchlist = ["AAPL", "msft", "AAPL", "  "]
symbols_per_batch = 2
max_signals = 8
initial_batches = 3
low_risk_threshold_pct = 2.0
high_risk_threshold_pct = 5.0
expiry_min_days = 2
expiry_max_days = 4

[portfolio]
value_floor = 10000.0
max_value_step = 50.0

[scheduler]
signal_interval = "3m"
portfolio_interval = "2m"
heartbeat_interval = "5m"

[logging]
level = "debug"
"#;

    #[test]
    fn parse_sample_toml() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.signals.max_signals, 8);
        assert_eq!(config.signals.rng_seed, None);
        assert_eq!(config.logging.format, "json");
        assert!(!config.finnhub.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn watchlist_is_normalized_and_deduped() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(
            config.signals.watchlist_symbols(),
            vec!["AAPL".to_string(), "MSFT".to_string()]
        );
    }

    #[test]
    fn parse_interval_valid() {
        assert_eq!(parse_interval_ms("30s").unwrap(), 30_000);
        assert_eq!(parse_interval_ms("3m").unwrap(), 180_000);
        assert_eq!(parse_interval_ms("2h").unwrap(), 7_200_000);
        assert_eq!(parse_interval_ms("1M").unwrap(), 2_592_000_000);
    }

    #[test]
    fn parse_interval_rejects_invalid_inputs() {
        assert!(parse_interval_ms("").is_err());
        assert!(parse_interval_ms("m").is_err());
        assert!(parse_interval_ms("0m").is_err());
        assert!(parse_interval_ms("1x").is_err());
    }

    #[test]
    fn parse_interval_rejects_multibyte_suffix() {
        let err = parse_interval_ms("3é").unwrap_err();
        assert!(err.to_string().contains("unsupported suffix"));
        assert!(parse_interval_ms("é").is_err());
        assert!(parse_interval_ms("ém").is_err());
    }

    #[test]
    fn blank_api_key_counts_as_unconfigured() {
        let mut config = Config::from_toml_str(SAMPLE).unwrap();
        config.finnhub.api_key = Some("   ".to_string());
        assert!(!config.finnhub.is_configured());
        config.finnhub.api_key = Some("abc".to_string());
        assert!(config.finnhub.is_configured());
    }
}
