use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use tradesafe::config::{parse_interval_ms, Config};
use tradesafe::dashboard::DashboardSettings;
use tradesafe::signal_engine::SignalPolicy;

fn shipped_config() -> Config {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
    Config::from_path(&path).expect("shipped config should parse")
}

#[test]
/// Verifies the shipped defaults:
/// cap 8, thresholds 2/5, a 2..=4 day expiry window and 3m/2m/5m schedules.
fn shipped_config_parses_and_validates() {
    let config = shipped_config();
    config.validate().expect("shipped config should validate");

    assert_eq!(config.server.port, 3000);
    assert_eq!(config.finnhub.base_url, "https://finnhub.io/api/v1");
    assert_eq!(config.finnhub.timeout(), Duration::from_secs(10));
    assert!(config.finnhub.api_key.is_none());
    assert_eq!(config.signals.max_signals, 8);
    assert_eq!(config.signals.symbols_per_batch, 2);
    assert_eq!(config.signals.initial_batches, 3);
    assert_eq!(config.signals.watchlist_symbols().len(), 8);
    assert!((config.portfolio.value_floor - 10_000.0).abs() < f64::EPSILON);
    assert_eq!(
        config.scheduler.signal_interval().unwrap(),
        Duration::from_secs(180)
    );
    assert_eq!(
        config.scheduler.portfolio_interval().unwrap(),
        Duration::from_secs(120)
    );
    assert_eq!(
        config.scheduler.heartbeat_interval().unwrap(),
        Duration::from_secs(300)
    );
}

#[test]
fn shipped_config_matches_engine_defaults() {
    let config = shipped_config();
    assert_eq!(SignalPolicy::from(&config.signals), SignalPolicy::default());

    let settings = DashboardSettings::from_config(&config);
    let defaults = DashboardSettings::default();
    assert_eq!(settings.watchlist, defaults.watchlist);
    assert_eq!(settings.max_signals, defaults.max_signals);
    assert_eq!(settings.symbols_per_batch, defaults.symbols_per_batch);
}

#[test]
/// Verifies validation guards:
/// inverted thresholds, zero-day expiry, empty watchlists and bad intervals are rejected.
fn validate_rejects_inconsistent_settings() {
    let mut config = shipped_config();
    config.signals.low_risk_threshold_pct = 6.0;
    assert!(config.validate().is_err());

    let mut config = shipped_config();
    config.signals.expiry_min_days = 0;
    assert!(config.validate().is_err());

    let mut config = shipped_config();
    config.signals.expiry_min_days = 5;
    config.signals.expiry_max_days = 3;
    assert!(config.validate().is_err());

    let mut config = shipped_config();
    config.signals.watchlist = vec!["  ".to_string()];
    assert!(config.validate().is_err());

    let mut config = shipped_config();
    config.signals.max_signals = 0;
    assert!(config.validate().is_err());

    let mut config = shipped_config();
    config.scheduler.portfolio_interval = "2x".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn missing_sections_fail_to_parse() {
    let err = Config::from_toml_str("[server]\nport = 3000\n").unwrap_err();
    assert!(format!("{:#}", err).contains("invalid config toml"));
}

#[test]
fn parse_interval_covers_scheduler_units() {
    assert_eq!(parse_interval_ms("45s").unwrap(), 45_000);
    assert_eq!(parse_interval_ms("3m").unwrap(), 180_000);
    assert_eq!(parse_interval_ms("1d").unwrap(), 86_400_000);
    assert!(parse_interval_ms("-1m").is_err());
}

// Process environment is shared by every test in this binary.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const OVERRIDE_VARS: [&str; 4] = ["TRADESAFE_CONFIG", "FINNHUB_API_KEY", "PORT", "APP_ENV"];

fn temp_config() -> PathBuf {
    let shipped = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
    let path = std::env::temp_dir().join(format!("tradesafe-{}.toml", uuid::Uuid::new_v4()));
    std::fs::copy(&shipped, &path).unwrap();
    path
}

/// Run `Config::load` with exactly `vars` set among the override variables.
fn load_with_env(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let path = temp_config();
    let saved: Vec<_> = OVERRIDE_VARS
        .iter()
        .map(|k| (*k, std::env::var(k).ok()))
        .collect();

    for k in OVERRIDE_VARS {
        std::env::remove_var(k);
    }
    std::env::set_var("TRADESAFE_CONFIG", &path);
    for (k, v) in vars {
        std::env::set_var(k, v);
    }

    let result = Config::load();

    for (k, v) in saved {
        match v {
            Some(v) => std::env::set_var(k, v),
            None => std::env::remove_var(k),
        }
    }
    let _ = std::fs::remove_file(&path);
    result
}

#[test]
fn load_without_overrides_uses_file_values() {
    let config = load_with_env(&[]).unwrap();
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.environment, "development");
    assert!(!config.finnhub.is_configured());
}

#[test]
/// Verifies the API key override:
/// a blank key keeps mock mode, a real key switches to live mode.
fn finnhub_key_from_env() {
    let blank = load_with_env(&[("FINNHUB_API_KEY", "   ")]).unwrap();
    assert!(blank.finnhub.api_key.is_none());
    assert!(!blank.finnhub.is_configured());

    let keyed = load_with_env(&[("FINNHUB_API_KEY", "abc123")]).unwrap();
    assert_eq!(keyed.finnhub.api_key.as_deref(), Some("abc123"));
    assert!(keyed.finnhub.is_configured());
}

#[test]
fn port_override_is_parsed_or_rejected() {
    let config = load_with_env(&[("PORT", " 8081 ")]).unwrap();
    assert_eq!(config.server.port, 8081);

    let err = load_with_env(&[("PORT", "eighty")]).unwrap_err();
    assert!(format!("{:#}", err).contains("PORT 'eighty' is not a valid port"));

    assert!(load_with_env(&[("PORT", "70000")]).is_err());
}

#[test]
fn app_env_overrides_environment_unless_blank() {
    let config = load_with_env(&[("APP_ENV", "production")]).unwrap();
    assert_eq!(config.server.environment, "production");

    let config = load_with_env(&[("APP_ENV", "  ")]).unwrap();
    assert_eq!(config.server.environment, "development");
}

#[test]
fn missing_config_file_fails_with_path() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let missing = std::env::temp_dir().join(format!("tradesafe-missing-{}.toml", uuid::Uuid::new_v4()));
    let saved = std::env::var("TRADESAFE_CONFIG").ok();
    std::env::set_var("TRADESAFE_CONFIG", &missing);
    let result = Config::load();
    match saved {
        Some(v) => std::env::set_var("TRADESAFE_CONFIG", v),
        None => std::env::remove_var("TRADESAFE_CONFIG"),
    }
    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("failed to read"));
}
