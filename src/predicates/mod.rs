//! Pattern predicates.
//!
//! Each predicate evaluates one instrument's price history and either
//! contributes a `ScanResult` or silently excludes the instrument. The
//! scanner drives them over the universe; thresholds come from config,
//! never from code.
//!
//! The gainer ranking (`gainer::GainerScan`) works on whole-venue
//! snapshots rather than per-instrument history, so it runs outside
//! this trait.

pub mod breakout;
pub mod gainer;
pub mod pullback;
pub mod trendline;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::provider::MarketDataProvider;
use crate::types::{Candle, Instrument, ScanResult, ScanSkip, SortOrder};

/// A per-instrument pattern test.
///
/// `evaluate` receives the instrument's OHLCV history (ascending by date,
/// already fetched by the scanner) and may make supplemental provider
/// calls (e.g. investor flow for annotation). Returns:
/// - `Ok(Some(result))` — the instrument passed every stage;
/// - `Ok(None)` — no match;
/// - `Err(skip)` — classified exclusion (missing data, short history,
///   provider failure), handled at the instrument boundary.
#[async_trait]
pub trait PatternPredicate: Send + Sync {
    /// Short identifier used in config and logs.
    fn name(&self) -> &'static str;

    /// Human-readable title for the report header.
    fn label(&self) -> &'static str;

    /// How results should be ranked.
    fn sort_order(&self) -> SortOrder;

    async fn evaluate(
        &self,
        provider: &dyn MarketDataProvider,
        instrument: &Instrument,
        history: &[Candle],
        today: NaiveDate,
    ) -> Result<Option<ScanResult>, ScanSkip>;
}
