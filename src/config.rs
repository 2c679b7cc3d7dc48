//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (the webhook URL) are referenced by env-var name in the config
//! and resolved at runtime via `std::env::var`. Every threshold the
//! predicates use lives here — nothing is a source-code literal.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub calendar: CalendarConfig,
    pub universe: UniverseConfig,
    pub scan: ScanConfig,
    #[serde(default)]
    pub trendline: TrendlineConfig,
    #[serde(default)]
    pub pullback: PullbackConfig,
    #[serde(default)]
    pub breakout: BreakoutConfig,
    #[serde(default)]
    pub gainer: GainerConfig,
    pub report: ReportConfig,
    pub notifier: NotifierConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Base URL of the market-data HTTP API.
    pub base_url: String,
    /// Fixed pause between per-instrument fetches (provider rate limit).
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CalendarConfig {
    /// Highly-liquid reference ticker probed to detect holidays.
    #[serde(default = "default_reference_ticker")]
    pub reference_ticker: String,
    /// Whether a closed market posts an informational notice.
    #[serde(default)]
    pub notify_on_closed: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UniverseConfig {
    /// Venues to rank, e.g. ["kospi", "kosdaq"].
    pub markets: Vec<String>,
    /// Top-N by market capitalization per venue.
    pub depth: usize,
    /// Drop ETF/ETN tickers from the universe.
    #[serde(default)]
    pub exclude_etf: bool,
    /// Drop instruments whose display name contains any of these.
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    /// Which predicate runs this invocation:
    /// "trendline" | "pullback" | "breakout" | "gainer".
    pub predicate: String,
    /// Calendar days of OHLCV history fetched per instrument.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrendlineConfig {
    /// Local-minima window radius.
    pub radius: usize,
    /// How many low-price minima the line needs (3 or 4).
    pub minima_count: usize,
    /// Require decline-then-rise shape before fitting.
    pub shape_gate: bool,
    /// Fit through the last K−1 minima instead of all K.
    pub fit_skip_first: bool,
    pub r_squared_min: f64,
    /// Close must sit within [lower, upper] × extrapolated support price.
    pub band_lower: f64,
    pub band_upper: f64,
    pub min_history: usize,
    /// Known loss-making issuers, excluded by name.
    pub exclude_names: Vec<String>,
}

impl Default for TrendlineConfig {
    fn default() -> Self {
        Self {
            radius: 3,
            minima_count: 3,
            shape_gate: false,
            fit_skip_first: false,
            r_squared_min: 0.85,
            band_lower: 0.99,
            band_upper: 1.05,
            min_history: 50,
            exclude_names: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PullbackConfig {
    /// Days scanned for the flagpole, excluding today (15 or 30).
    pub lookback_days: usize,
    /// Minimum high-vs-prior-close rise to count as a flagpole (0.12/0.15).
    pub rise_threshold: f64,
    /// Today must not be up more than this vs yesterday (quiet day).
    pub quiet_rise_max: f64,
    /// Disparity-to-SMA20 band, in percent.
    pub disparity_min: f64,
    pub disparity_max: f64,
    /// Days of net-purchase flow summed for annotation.
    pub flow_days: usize,
}

impl Default for PullbackConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            rise_threshold: 0.12,
            quiet_rise_max: 0.03,
            disparity_min: 95.0,
            disparity_max: 110.0,
            flow_days: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BreakoutConfig {
    /// Days scanned newest-first for the trigger bar.
    pub window: usize,
    /// Trigger: high-vs-prior-close rise floor.
    pub rise_threshold: f64,
    /// Trigger: volume-vs-prior-day ratio floor.
    pub volume_ratio: f64,
    /// Oversold filter: disparity-to-SMA20 ceiling, in percent.
    pub disparity_max: f64,
    /// Post-trigger days must stay under this fraction of trigger volume.
    pub quiet_volume_ratio: f64,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            window: 30,
            rise_threshold: 0.10,
            volume_ratio: 2.0,
            disparity_max: 95.0,
            quiet_volume_ratio: 0.5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GainerConfig {
    /// Drop rows whose name contains any of these (leveraged/inverse/overseas).
    pub exclude_keywords: Vec<String>,
    /// Minimum trade value in KRW.
    pub min_trade_value: f64,
}

impl Default for GainerConfig {
    fn default() -> Self {
        Self {
            exclude_keywords: Vec::new(),
            min_trade_value: 0.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    /// Results kept after ranking.
    pub top_k: usize,
    /// "table" (monospace) or "itemized" (one line per result, with icons).
    #[serde(default = "default_report_style")]
    pub style: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotifierConfig {
    /// Env var holding the webhook URL (the URL itself is a secret).
    pub webhook_url_env: String,
    #[serde(default = "default_chunk_limit")]
    pub chunk_limit: usize,
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,
}

fn default_request_delay_ms() -> u64 {
    300
}

fn default_reference_ticker() -> String {
    "005930".to_string()
}

fn default_lookback_days() -> i64 {
    90
}

fn default_report_style() -> String {
    "table".to_string()
}

fn default_chunk_limit() -> usize {
    1900
}

fn default_chunk_delay_ms() -> u64 {
    500
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [provider]
        base_url = "http://localhost:9000"

        [calendar]

        [universe]
        markets = ["kospi", "kosdaq"]
        depth = 200

        [scan]
        predicate = "trendline"

        [report]
        top_k = 15

        [notifier]
        webhook_url_env = "KRXSCAN_WEBHOOK_URL"
    "#;

    #[test]
    fn test_parse_minimal_config() {
        let cfg: AppConfig = toml::from_str(MINIMAL).unwrap();
        assert_eq!(cfg.universe.depth, 200);
        assert_eq!(cfg.scan.predicate, "trendline");
        assert_eq!(cfg.scan.lookback_days, 90);
        assert_eq!(cfg.calendar.reference_ticker, "005930");
        assert_eq!(cfg.notifier.chunk_limit, 1900);
        assert_eq!(cfg.report.style, "table");
    }

    #[test]
    fn test_predicate_defaults() {
        let cfg: AppConfig = toml::from_str(MINIMAL).unwrap();
        assert_eq!(cfg.trendline.r_squared_min, 0.85);
        assert_eq!(cfg.trendline.band_lower, 0.99);
        assert_eq!(cfg.trendline.band_upper, 1.05);
        assert_eq!(cfg.pullback.lookback_days, 30);
        assert_eq!(cfg.breakout.volume_ratio, 2.0);
        assert_eq!(cfg.breakout.quiet_volume_ratio, 0.5);
    }

    #[test]
    fn test_threshold_overrides() {
        let toml_src = format!(
            "{MINIMAL}\n[pullback]\nlookback_days = 15\nrise_threshold = 0.15\nquiet_rise_max = 0.04\n"
        );
        let cfg: AppConfig = toml::from_str(&toml_src).unwrap();
        assert_eq!(cfg.pullback.lookback_days, 15);
        assert_eq!(cfg.pullback.rise_threshold, 0.15);
        // untouched fields keep their defaults
        assert_eq!(cfg.pullback.disparity_min, 95.0);
    }
}
