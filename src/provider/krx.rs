//! KRX market-data gateway client.
//!
//! Talks to a JSON-over-HTTP market-data gateway exposing KRX daily data
//! (OHLCV, market-cap ranking, ETF listing, investor net-purchase flow,
//! whole-venue snapshots). The gateway base URL comes from config so the
//! same binary works against production and a local fixture server.
//!
//! All endpoints are plain GETs returning JSON arrays. Dates travel as
//! `YYYYMMDD` both ways, matching the exchange's own convention.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::MarketDataProvider;
use crate::types::{Candle, FlowRecord, Instrument, Market, SnapshotRow};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const PROVIDER_NAME: &str = "krx";
const DATE_FMT: &str = "%Y%m%d";

// ---------------------------------------------------------------------------
// API response types (gateway JSON → Rust)
// ---------------------------------------------------------------------------

/// One OHLCV row as returned by `/v1/ohlcv`.
#[derive(Debug, Deserialize)]
struct OhlcvRow {
    /// Trade date, `YYYYMMDD`.
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(default)]
    value: Option<f64>,
}

/// One ranking row as returned by `/v1/marcap`.
/// Rows arrive ranked by market cap descending; order is preserved.
#[derive(Debug, Deserialize)]
struct RankingRow {
    code: String,
    name: String,
}

/// One ETF/ETN listing row as returned by `/v1/etf`.
#[derive(Debug, Deserialize)]
struct EtfRow {
    code: String,
}

/// One investor-flow row as returned by `/v1/flow`.
#[derive(Debug, Deserialize)]
struct FlowRow {
    date: String,
    institutional: f64,
    foreign: f64,
}

/// One snapshot row as returned by `/v1/snapshot`.
#[derive(Debug, Deserialize)]
struct ApiSnapshotRow {
    code: String,
    name: String,
    close: f64,
    #[serde(default)]
    change_pct: Option<f64>,
    #[serde(default)]
    value: f64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// KRX gateway client.
pub struct KrxClient {
    http: Client,
    base_url: String,
}

impl KrxClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("KRXSCAN/0.1.0")
            .build()
            .context("Failed to build HTTP client for KRX gateway")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET a gateway path and deserialize the JSON array body.
    async fn get_rows<T: serde::de::DeserializeOwned>(&self, path_and_query: &str) -> Result<Vec<T>> {
        let url = format!("{}{}", self.base_url, path_and_query);
        debug!(url = %url, "Fetching from KRX gateway");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("KRX gateway request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("KRX gateway error {status}: {body}");
        }

        let rows: Vec<T> = resp
            .json()
            .await
            .context("Failed to parse KRX gateway response")?;

        Ok(rows)
    }

    /// Parse a `YYYYMMDD` gateway date.
    fn parse_date(s: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(s, DATE_FMT)
            .with_context(|| format!("Bad gateway date: {s}"))
    }

    fn fmt_date(d: NaiveDate) -> String {
        d.format(DATE_FMT).to_string()
    }
}

#[async_trait]
impl MarketDataProvider for KrxClient {
    async fn ohlcv(&self, code: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<Candle>> {
        let rows: Vec<OhlcvRow> = self
            .get_rows(&format!(
                "/v1/ohlcv?code={}&from={}&to={}",
                urlencoding::encode(code),
                Self::fmt_date(from),
                Self::fmt_date(to),
            ))
            .await?;

        rows.into_iter()
            .map(|r| {
                Ok(Candle {
                    date: Self::parse_date(&r.date)?,
                    open: r.open,
                    high: r.high,
                    low: r.low,
                    close: r.close,
                    volume: r.volume,
                    value: r.value,
                })
            })
            .collect()
    }

    async fn market_cap_ranking(&self, date: NaiveDate, market: Market)
        -> Result<Vec<Instrument>>
    {
        let rows: Vec<RankingRow> = self
            .get_rows(&format!(
                "/v1/marcap?date={}&market={}",
                Self::fmt_date(date),
                market.code(),
            ))
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| Instrument {
                code: r.code,
                name: r.name,
                market,
            })
            .collect())
    }

    async fn etf_tickers(&self, date: NaiveDate) -> Result<Vec<String>> {
        let rows: Vec<EtfRow> = self
            .get_rows(&format!("/v1/etf?date={}", Self::fmt_date(date)))
            .await?;
        Ok(rows.into_iter().map(|r| r.code).collect())
    }

    async fn investor_flow(&self, code: &str, from: NaiveDate, to: NaiveDate)
        -> Result<Vec<FlowRecord>>
    {
        let rows: Vec<FlowRow> = self
            .get_rows(&format!(
                "/v1/flow?code={}&from={}&to={}",
                urlencoding::encode(code),
                Self::fmt_date(from),
                Self::fmt_date(to),
            ))
            .await?;

        rows.into_iter()
            .map(|r| {
                Ok(FlowRecord {
                    date: Self::parse_date(&r.date)?,
                    institutional: r.institutional,
                    foreign: r.foreign,
                })
            })
            .collect()
    }

    async fn snapshot(&self, date: NaiveDate, market: Market) -> Result<Vec<SnapshotRow>> {
        let rows: Vec<ApiSnapshotRow> = self
            .get_rows(&format!(
                "/v1/snapshot?date={}&market={}",
                Self::fmt_date(date),
                market.code(),
            ))
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| SnapshotRow {
                code: r.code,
                name: r.name,
                close: r.close,
                change_pct: r.change_pct,
                value: r.value,
            })
            .collect())
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
