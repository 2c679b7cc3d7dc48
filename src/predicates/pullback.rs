//! Flagpole-then-consolidation ("N-shape pullback") predicate.
//!
//! Looks for a sharp single-day rise (the flagpole) in the recent
//! window, followed by a quiet pullback: today must be calm (small
//! change, no volume expansion) and the close must have retraced to,
//! but not far below, its 20-day average. Institutional/foreign net
//! flow over the last few days is attached as annotation only.
//!
//! Ranked by flagpole magnitude descending.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use tracing::debug;

use super::PatternPredicate;
use crate::analysis::{disparity, sma};
use crate::config::PullbackConfig;
use crate::provider::MarketDataProvider;
use crate::types::{Candle, FlowSummary, Instrument, ScanResult, ScanSkip, SortOrder};

pub struct PullbackPredicate {
    cfg: PullbackConfig,
}

/// The flagpole day found in the lookback window.
#[derive(Debug, Clone, Copy)]
pub struct Flagpole {
    pub index: usize,
    /// High-vs-prior-close rise, as a fraction.
    pub rise: f64,
}

impl PullbackPredicate {
    pub fn new(cfg: PullbackConfig) -> Self {
        Self { cfg }
    }

    /// Today is "quiet": not up more than the threshold vs yesterday,
    /// and volume no higher than yesterday's.
    fn is_quiet_day(&self, today: &Candle, yesterday: &Candle) -> bool {
        if yesterday.close == 0.0 {
            return false;
        }
        let change = today.close / yesterday.close - 1.0;
        change <= self.cfg.quiet_rise_max && today.volume <= yesterday.volume
    }

    /// Most recent flagpole in the window before today, scanning
    /// backward and stopping at the first qualifying day.
    pub fn find_flagpole(&self, candles: &[Candle]) -> Option<Flagpole> {
        let last = candles.len() - 1; // today, excluded from the scan
        let earliest = last.saturating_sub(self.cfg.lookback_days).max(1);
        for i in (earliest..last).rev() {
            let prev_close = candles[i - 1].close;
            if prev_close == 0.0 {
                continue;
            }
            let rise = candles[i].high / prev_close - 1.0;
            if rise >= self.cfg.rise_threshold {
                return Some(Flagpole { index: i, rise });
            }
        }
        None
    }

    /// Sum net-purchase flow over the most recent `flow_days` records.
    /// Annotation only: a failed fetch never excludes the instrument.
    async fn flow_annotation(
        &self,
        provider: &dyn MarketDataProvider,
        instrument: &Instrument,
        today: NaiveDate,
    ) -> Option<FlowSummary> {
        // Calendar buffer so the window still holds `flow_days` trading days.
        let from = today - Duration::days(self.cfg.flow_days as i64 * 2 + 4);
        match provider.investor_flow(&instrument.code, from, today).await {
            Ok(records) => {
                let tail = records.len().saturating_sub(self.cfg.flow_days);
                let mut sum = FlowSummary::default();
                for r in &records[tail..] {
                    sum.institutional += r.institutional;
                    sum.foreign += r.foreign;
                }
                Some(sum)
            }
            Err(e) => {
                debug!(code = %instrument.code, error = %e, "Flow fetch failed, skipping annotation");
                None
            }
        }
    }
}

#[async_trait]
impl PatternPredicate for PullbackPredicate {
    fn name(&self) -> &'static str {
        "pullback"
    }

    fn label(&self) -> &'static str {
        "N자형 눌림목 종목"
    }

    fn sort_order(&self) -> SortOrder {
        SortOrder::Descending
    }

    async fn evaluate(
        &self,
        provider: &dyn MarketDataProvider,
        instrument: &Instrument,
        history: &[Candle],
        today: NaiveDate,
    ) -> Result<Option<ScanResult>, ScanSkip> {
        let need = (self.cfg.lookback_days + 1).max(21);
        if history.len() < need {
            return Err(ScanSkip::InsufficientHistory { have: history.len(), need });
        }

        let today_bar = &history[history.len() - 1];
        let yesterday = &history[history.len() - 2];

        // (a) today must be quiet.
        if !self.is_quiet_day(today_bar, yesterday) {
            return Ok(None);
        }

        // (b) a flagpole must exist in the prior window.
        let flagpole = match self.find_flagpole(history) {
            Some(fp) => fp,
            None => return Ok(None),
        };

        // (c) pulled back to, but not far below, the 20-day average.
        let closes: Vec<f64> = history.iter().map(|c| c.close).collect();
        let ma20 = sma(&closes, 20).ok_or(ScanSkip::InsufficientHistory {
            have: closes.len(),
            need: 20,
        })?;
        let disp = disparity(today_bar.close, ma20);
        if disp < self.cfg.disparity_min || disp > self.cfg.disparity_max {
            return Ok(None);
        }

        // (d) descriptive flow annotation, not a gate.
        let flow = self.flow_annotation(provider, instrument, today).await;

        let mut result = ScanResult::new(instrument.clone(), flagpole.rise * 100.0)
            .with_metric("flagpole_pct", flagpole.rise * 100.0)
            .with_metric("disparity", disp)
            .with_metric("close", today_bar.close);
        result.flow = flow;
        Ok(Some(result))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
