//! Staged breakout-then-silence predicate.
//!
//! Three sequential gates, each evaluated only if the prior passed:
//!
//! 1. Trigger bar — newest-first scan of the recent window for a day
//!    with an outsized high-vs-prior-close rise on a volume spike.
//! 2. Oversold filter — close has sunk to at most a configured fraction
//!    of the 20-day average.
//! 3. Quiet accumulation — every day strictly after the trigger stayed
//!    under half the trigger day's volume. A trigger with no days after
//!    it is rejected: there is no observation window yet.
//!
//! Ranked by trigger rise descending — most explosive flagpole first.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::PatternPredicate;
use crate::analysis::{disparity, sma};
use crate::config::BreakoutConfig;
use crate::provider::MarketDataProvider;
use crate::types::{Candle, Instrument, ScanResult, ScanSkip, SortOrder};

/// The trigger bar found by stage 1.
#[derive(Debug, Clone, Copy)]
pub struct Trigger {
    pub index: usize,
    pub volume: f64,
    /// High-vs-prior-close rise, as a fraction.
    pub rise: f64,
}

pub struct BreakoutPredicate {
    cfg: BreakoutConfig,
}

impl BreakoutPredicate {
    pub fn new(cfg: BreakoutConfig) -> Self {
        Self { cfg }
    }

    /// Stage 1: most recent day in the window where the high rose at
    /// least `rise_threshold` over the prior close AND volume was at
    /// least `volume_ratio` times the prior day's.
    pub fn find_trigger(&self, candles: &[Candle]) -> Option<Trigger> {
        let last = candles.len() - 1;
        let earliest = (candles.len().saturating_sub(self.cfg.window)).max(1);
        for i in (earliest..=last).rev() {
            let prev = &candles[i - 1];
            if prev.close == 0.0 {
                continue;
            }
            let rise = candles[i].high / prev.close - 1.0;
            let volume_spiked = candles[i].volume >= self.cfg.volume_ratio * prev.volume;
            if rise >= self.cfg.rise_threshold && volume_spiked {
                return Some(Trigger { index: i, volume: candles[i].volume, rise });
            }
        }
        None
    }

    /// Stage 2: close at or below `disparity_max`% of the 20-day average.
    pub fn is_oversold(&self, candles: &[Candle]) -> Option<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let ma20 = sma(&closes, 20)?;
        let disp = disparity(closes[closes.len() - 1], ma20);
        (disp <= self.cfg.disparity_max).then_some(disp)
    }

    /// Stage 3: every day strictly after the trigger stayed under
    /// `quiet_volume_ratio` of the trigger volume. A trigger on the
    /// final bar has no observation window and always fails.
    pub fn is_quiet_after(&self, candles: &[Candle], trigger: &Trigger) -> bool {
        if trigger.index == candles.len() - 1 {
            return false;
        }
        candles[trigger.index + 1..]
            .iter()
            .all(|c| c.volume <= self.cfg.quiet_volume_ratio * trigger.volume)
    }
}

#[async_trait]
impl PatternPredicate for BreakoutPredicate {
    fn name(&self) -> &'static str {
        "breakout"
    }

    fn label(&self) -> &'static str {
        "거래폭발 후 침묵 종목"
    }

    fn sort_order(&self) -> SortOrder {
        SortOrder::Descending
    }

    async fn evaluate(
        &self,
        _provider: &dyn MarketDataProvider,
        instrument: &Instrument,
        history: &[Candle],
        _today: NaiveDate,
    ) -> Result<Option<ScanResult>, ScanSkip> {
        let need = (self.cfg.window + 1).max(21);
        if history.len() < need {
            return Err(ScanSkip::InsufficientHistory { have: history.len(), need });
        }

        let trigger = match self.find_trigger(history) {
            Some(t) => t,
            None => return Ok(None),
        };

        let disp = match self.is_oversold(history) {
            Some(d) => d,
            None => return Ok(None),
        };

        if !self.is_quiet_after(history, &trigger) {
            return Ok(None);
        }

        let days_since = (history.len() - 1 - trigger.index) as f64;
        Ok(Some(
            ScanResult::new(instrument.clone(), trigger.rise * 100.0)
                .with_metric("trigger_rise_pct", trigger.rise * 100.0)
                .with_metric("disparity", disp)
                .with_metric("days_since_trigger", days_since),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
