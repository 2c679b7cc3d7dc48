//! Mock market-data provider for integration testing.
//!
//! Provides a deterministic `MarketDataProvider` implementation backed
//! by in-memory tables — candle histories, venue rankings, ETF lists,
//! flow records — fully controllable from test code, plus builders for
//! crafted price series.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::sync::Mutex;

use krxscan::provider::MarketDataProvider;
use krxscan::types::*;

/// A mock data provider with all state in memory.
pub struct MockProvider {
    candles: HashMap<String, Vec<Candle>>,
    rankings: HashMap<Market, Vec<Instrument>>,
    etf_codes: Vec<String>,
    flows: HashMap<String, Vec<FlowRecord>>,
    snapshots: HashMap<(NaiveDate, Market), Vec<SnapshotRow>>,
    /// If set, all operations return this error.
    force_error: Mutex<Option<String>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            candles: HashMap::new(),
            rankings: HashMap::new(),
            etf_codes: Vec::new(),
            flows: HashMap::new(),
            snapshots: HashMap::new(),
            force_error: Mutex::new(None),
        }
    }

    pub fn with_history(mut self, code: &str, candles: Vec<Candle>) -> Self {
        self.candles.insert(code.to_string(), candles);
        self
    }

    pub fn with_ranking(mut self, market: Market, instruments: Vec<Instrument>) -> Self {
        self.rankings.insert(market, instruments);
        self
    }

    pub fn with_etfs(mut self, codes: &[&str]) -> Self {
        self.etf_codes = codes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_flow(mut self, code: &str, records: Vec<FlowRecord>) -> Self {
        self.flows.insert(code.to_string(), records);
        self
    }

    pub fn with_snapshot(
        mut self,
        date: NaiveDate,
        market: Market,
        rows: Vec<SnapshotRow>,
    ) -> Self {
        self.snapshots.insert((date, market), rows);
        self
    }

    /// Force all subsequent operations to return an error.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    fn check_error(&self) -> Result<()> {
        if let Some(msg) = self.force_error.lock().unwrap().clone() {
            return Err(anyhow!(msg));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    async fn ohlcv(&self, code: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<Candle>> {
        self.check_error()?;
        Ok(self
            .candles
            .get(code)
            .map(|cs| {
                cs.iter()
                    .filter(|c| c.date >= from && c.date <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn market_cap_ranking(&self, _date: NaiveDate, market: Market)
        -> Result<Vec<Instrument>>
    {
        self.check_error()?;
        Ok(self.rankings.get(&market).cloned().unwrap_or_default())
    }

    async fn etf_tickers(&self, _date: NaiveDate) -> Result<Vec<String>> {
        self.check_error()?;
        Ok(self.etf_codes.clone())
    }

    async fn investor_flow(&self, code: &str, from: NaiveDate, to: NaiveDate)
        -> Result<Vec<FlowRecord>>
    {
        self.check_error()?;
        Ok(self
            .flows
            .get(code)
            .map(|fs| {
                fs.iter()
                    .filter(|f| f.date >= from && f.date <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn snapshot(&self, date: NaiveDate, market: Market) -> Result<Vec<SnapshotRow>> {
        self.check_error()?;
        Ok(self
            .snapshots
            .get(&(date, market))
            .cloned()
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Series builders
// ---------------------------------------------------------------------------

/// First date of every generated series.
pub fn series_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
}

/// Date of bar `i` in a generated series (one bar per calendar day).
pub fn series_day(i: usize) -> NaiveDate {
    series_start() + Duration::days(i as i64)
}

/// A flat bar at `price` with the given volume.
pub fn flat_bar(i: usize, price: f64, volume: f64) -> Candle {
    Candle {
        date: series_day(i),
        open: price,
        high: price,
        low: price,
        close: price,
        volume,
        value: Some(price * volume),
    }
}

/// 90 flat, low-volume days at `price`.
pub fn quiet_series(price: f64) -> Vec<Candle> {
    (0..90).map(|i| flat_bar(i, price, 10_000.0)).collect()
}

/// 90-day series with a 20% single-day rise on heavy volume at day 60,
/// followed by flat low-volume days through day 89 — the canonical
/// flagpole-then-silence shape both the pullback and breakout
/// predicates should match.
pub fn flagpole_series(price: f64) -> Vec<Candle> {
    let mut candles = quiet_series(price);
    candles[60].high = price * 1.20;
    candles[60].close = price * 1.04;
    candles[60].volume = 80_000.0;
    // Price drifts back down after the spike; closes sit just under the
    // 20-day average so the pullback band and the oversold filter both see
    // a retracement.
    for bar in candles.iter_mut().skip(61) {
        bar.open = price;
        bar.high = price;
        bar.low = price * 0.99;
        bar.close = price;
        bar.volume = 9_000.0;
    }
    candles
}
