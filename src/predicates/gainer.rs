//! Daily % gainer ranking over whole-venue snapshots.
//!
//! Unlike the per-instrument predicates, this works on one (or two)
//! venue snapshots at a time: compute day-over-day close change for
//! every row, apply the name-keyword exclusion and trade-value floor,
//! keep only positive changes. Intended for the ETF-focused variants.
//!
//! Uses provider-supplied change figures when present, otherwise
//! recomputes the change by joining against the previous snapshot.

use anyhow::Result;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::GainerConfig;
use crate::provider::MarketDataProvider;
use crate::types::{Instrument, Market, ScanResult, SnapshotRow, SortOrder};

/// Most recent weekday strictly before `date`: the comparison snapshot
/// for recomputed change figures. A holiday gap simply yields missing
/// joins, which skip the affected rows.
pub fn prev_weekday(date: NaiveDate) -> NaiveDate {
    use chrono::{Datelike, Duration, Weekday};
    let mut d = date - Duration::days(1);
    while matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
        d -= Duration::days(1);
    }
    d
}

pub struct GainerScan {
    cfg: GainerConfig,
}

impl GainerScan {
    pub fn new(cfg: GainerConfig) -> Self {
        Self { cfg }
    }

    pub fn label(&self) -> &'static str {
        "금일 상승률 상위 종목"
    }

    pub fn sort_order(&self) -> SortOrder {
        SortOrder::Descending
    }

    /// Rank one venue's snapshot. `prev` is only consulted for rows the
    /// provider did not annotate with a change figure.
    pub fn rank_snapshot(
        &self,
        rows: &[SnapshotRow],
        prev: Option<&[SnapshotRow]>,
        market: Market,
    ) -> Vec<ScanResult> {
        let prev_closes: HashMap<&str, f64> = prev
            .map(|p| p.iter().map(|r| (r.code.as_str(), r.close)).collect())
            .unwrap_or_default();

        let mut results = Vec::new();
        for row in rows {
            if self
                .cfg
                .exclude_keywords
                .iter()
                .any(|kw| row.name.contains(kw.as_str()))
            {
                continue;
            }
            if row.value < self.cfg.min_trade_value {
                continue;
            }

            let change = match row.change_pct {
                Some(c) => c,
                None => match prev_closes.get(row.code.as_str()) {
                    Some(&prev_close) if prev_close != 0.0 => {
                        (row.close / prev_close - 1.0) * 100.0
                    }
                    _ => {
                        debug!(code = %row.code, "No prior close for change computation");
                        continue;
                    }
                },
            };

            if change <= 0.0 {
                continue;
            }

            let instrument = Instrument {
                code: row.code.clone(),
                name: row.name.clone(),
                market,
            };
            results.push(
                ScanResult::new(instrument, change)
                    .with_metric("change_pct", change)
                    .with_metric("close", row.close)
                    .with_metric("trade_value", row.value),
            );
        }
        results
    }

    /// Fetch and rank snapshots for the given venues. A failed venue
    /// contributes nothing; the scan proceeds with the rest.
    pub async fn run(
        &self,
        provider: &dyn MarketDataProvider,
        date: NaiveDate,
        prev_date: NaiveDate,
        markets: &[Market],
    ) -> Result<Vec<ScanResult>> {
        let mut all = Vec::new();
        for &market in markets {
            let rows = match provider.snapshot(date, market).await {
                Ok(rows) => rows,
                Err(e) => {
                    warn!(%market, error = %e, "Snapshot fetch failed, skipping venue");
                    continue;
                }
            };

            // Only fetch the prior snapshot when we actually need it.
            let needs_prev = rows.iter().any(|r| r.change_pct.is_none());
            let prev = if needs_prev {
                match provider.snapshot(prev_date, market).await {
                    Ok(p) => Some(p),
                    Err(e) => {
                        warn!(%market, error = %e, "Prior snapshot fetch failed");
                        None
                    }
                }
            } else {
                None
            };

            all.extend(self.rank_snapshot(&rows, prev.as_deref(), market));
        }
        Ok(all)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
