//! Per-instrument scanner.
//!
//! Drives one predicate over the universe sequentially: one OHLCV fetch
//! per instrument with a fixed pause in between (the provider is
//! rate-sensitive, not us), predicate evaluation, and classified
//! skip handling at the instrument boundary. One bad instrument never
//! aborts the batch.

use chrono::{Duration as ChronoDuration, NaiveDate};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::predicates::PatternPredicate;
use crate::provider::MarketDataProvider;
use crate::types::{Instrument, ScanResult, ScanSkip};

/// Counters reported after a scan pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanStats {
    pub scanned: usize,
    pub matched: usize,
    pub skipped: usize,
    pub errored: usize,
}

pub struct Scanner {
    /// Calendar days of history fetched per instrument.
    lookback_days: i64,
    /// Pause between per-instrument fetches.
    fetch_delay: Duration,
}

impl Scanner {
    pub fn new(lookback_days: i64, fetch_delay: Duration) -> Self {
        Self {
            lookback_days,
            fetch_delay,
        }
    }

    /// Evaluate `predicate` against every instrument in the universe.
    ///
    /// Returns the passing results (unranked) and the pass counters.
    pub async fn scan(
        &self,
        provider: &dyn MarketDataProvider,
        predicate: &dyn PatternPredicate,
        universe: &[Instrument],
        today: NaiveDate,
    ) -> (Vec<ScanResult>, ScanStats) {
        let from = today - ChronoDuration::days(self.lookback_days);
        let mut results = Vec::new();
        let mut stats = ScanStats::default();

        info!(
            predicate = predicate.name(),
            universe = universe.len(),
            from = %from,
            to = %today,
            "Scan pass starting"
        );

        for (i, instrument) in universe.iter().enumerate() {
            if i > 0 && !self.fetch_delay.is_zero() {
                tokio::time::sleep(self.fetch_delay).await;
            }
            stats.scanned += 1;

            match self.scan_one(provider, predicate, instrument, from, today).await {
                Ok(Some(result)) => {
                    debug!(code = %instrument.code, rank_key = result.rank_key, "Match");
                    results.push(result);
                    stats.matched += 1;
                }
                Ok(None) => {}
                Err(skip) if skip.is_expected() => {
                    debug!(code = %instrument.code, reason = %skip, "Skipped");
                    stats.skipped += 1;
                }
                Err(skip) => {
                    warn!(code = %instrument.code, error = %skip, "Instrument failed — continuing");
                    stats.errored += 1;
                }
            }
        }

        info!(
            matched = stats.matched,
            skipped = stats.skipped,
            errored = stats.errored,
            "Scan pass complete"
        );
        (results, stats)
    }

    async fn scan_one(
        &self,
        provider: &dyn MarketDataProvider,
        predicate: &dyn PatternPredicate,
        instrument: &Instrument,
        from: NaiveDate,
        today: NaiveDate,
    ) -> Result<Option<ScanResult>, ScanSkip> {
        let history = provider.ohlcv(&instrument.code, from, today).await?;
        if history.is_empty() {
            return Err(ScanSkip::MissingData);
        }
        predicate.evaluate(provider, instrument, &history, today).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
