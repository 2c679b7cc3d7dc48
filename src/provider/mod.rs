//! Market-data provider integrations.
//!
//! Defines the `MarketDataProvider` trait and provides the KRX
//! JSON-over-HTTP implementation. Everything the pipeline knows about
//! prices, rankings, and investor flow comes through this trait, which
//! keeps the scanner testable against an in-memory mock.

pub mod krx;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::{Candle, FlowRecord, Instrument, Market, SnapshotRow};

/// Abstraction over the market-data provider.
///
/// All operations are remote, fallible, rate-sensitive reads returning
/// tabular snapshots keyed by instrument and date. Implementors must not
/// mutate or reorder the provider's data: candle and flow sequences are
/// ascending by date, rankings keep the provider's native order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily OHLCV history for one instrument, ascending by date.
    /// An empty vector means the provider has no data in the range
    /// (e.g. a holiday probe).
    async fn ohlcv(&self, code: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<Candle>>;

    /// Instruments of one venue ranked by market capitalization
    /// descending, as of the snapshot date.
    async fn market_cap_ranking(&self, date: NaiveDate, market: Market)
        -> Result<Vec<Instrument>>;

    /// Ticker codes of all ETF/ETN instruments as of the date.
    async fn etf_tickers(&self, date: NaiveDate) -> Result<Vec<String>>;

    /// Institutional/foreign net-purchase history for one instrument,
    /// ascending by date.
    async fn investor_flow(&self, code: &str, from: NaiveDate, to: NaiveDate)
        -> Result<Vec<FlowRecord>>;

    /// Whole-venue close/change/value snapshot for one date.
    async fn snapshot(&self, date: NaiveDate, market: Market) -> Result<Vec<SnapshotRow>>;

    /// Provider name for logging and identification.
    fn name(&self) -> &str;
}
