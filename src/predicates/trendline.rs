//! Trend-line support predicate.
//!
//! Fits a least-squares line through the last K local minima of the low
//! price and accepts instruments whose close sits at-or-just-above the
//! extrapolated support line: not far below (false breakout), not far
//! above (already extended). An optional shape gate requires a
//! decline-then-turn sequence of minima rather than a flat bottom.
//!
//! Ranked by disparity-to-SMA20 ascending — closest to support first.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use super::PatternPredicate;
use crate::analysis::{disparity, fit_line, local_minima, sma};
use crate::config::TrendlineConfig;
use crate::provider::MarketDataProvider;
use crate::types::{Candle, Instrument, ScanResult, ScanSkip, SortOrder};

pub struct TrendlinePredicate {
    cfg: TrendlineConfig,
}

impl TrendlinePredicate {
    pub fn new(cfg: TrendlineConfig) -> Self {
        Self { cfg }
    }

    /// Low-price pivot indices usable as completed support touches.
    ///
    /// The most recent qualifying minimum is dropped when it sits at the
    /// last eligible position: today's bar is part of its confirmation
    /// window and today's close is never final.
    fn completed_minima(&self, lows: &[f64]) -> Vec<usize> {
        let mut minima = local_minima(lows, self.cfg.radius);
        if let Some(&last) = minima.last() {
            if last + self.cfg.radius + 1 == lows.len() {
                minima.pop();
            }
        }
        minima
    }

    /// Decline-then-turn gate: first minimum above the second, and the
    /// minima after the second strictly increasing.
    fn shape_ok(lows: &[f64], pivots: &[usize]) -> bool {
        if pivots.len() < 2 {
            return false;
        }
        if lows[pivots[0]] <= lows[pivots[1]] {
            return false;
        }
        pivots
            .windows(2)
            .skip(1)
            .all(|w| lows[w[1]] > lows[w[0]])
    }
}

#[async_trait]
impl PatternPredicate for TrendlinePredicate {
    fn name(&self) -> &'static str {
        "trendline"
    }

    fn label(&self) -> &'static str {
        "추세선 지지 종목"
    }

    fn sort_order(&self) -> SortOrder {
        SortOrder::Ascending
    }

    async fn evaluate(
        &self,
        _provider: &dyn MarketDataProvider,
        instrument: &Instrument,
        history: &[Candle],
        _today: NaiveDate,
    ) -> Result<Option<ScanResult>, ScanSkip> {
        // Hardcoded business knowledge, supplied as config data.
        if self
            .cfg
            .exclude_names
            .iter()
            .any(|n| instrument.name.contains(n.as_str()))
        {
            debug!(code = %instrument.code, "On trendline exclusion list");
            return Ok(None);
        }

        if history.len() < self.cfg.min_history {
            return Err(ScanSkip::InsufficientHistory {
                have: history.len(),
                need: self.cfg.min_history,
            });
        }

        let lows: Vec<f64> = history.iter().map(|c| c.low).collect();
        let closes: Vec<f64> = history.iter().map(|c| c.close).collect();

        let minima = self.completed_minima(&lows);
        if minima.len() < self.cfg.minima_count {
            return Ok(None);
        }
        let pivots = &minima[minima.len() - self.cfg.minima_count..];

        if self.cfg.shape_gate && !Self::shape_ok(&lows, pivots) {
            return Ok(None);
        }

        let fitted = if self.cfg.fit_skip_first { &pivots[1..] } else { pivots };
        let points: Vec<(f64, f64)> = fitted.iter().map(|&i| (i as f64, lows[i])).collect();

        let fit = fit_line(&points);
        if fit.r_squared < self.cfg.r_squared_min {
            debug!(
                code = %instrument.code,
                r_squared = fit.r_squared,
                "Trend fit too weak"
            );
            return Ok(None);
        }

        let today_idx = (history.len() - 1) as f64;
        let expected = fit.value_at(today_idx);
        let close = closes[closes.len() - 1];

        // Inclusive support band around the extrapolated line.
        if close < self.cfg.band_lower * expected || close > self.cfg.band_upper * expected {
            return Ok(None);
        }

        let ma20 = sma(&closes, 20).ok_or(ScanSkip::InsufficientHistory {
            have: closes.len(),
            need: 20,
        })?;
        let disp = disparity(close, ma20);

        Ok(Some(
            ScanResult::new(instrument.clone(), disp)
                .with_metric("close", close)
                .with_metric("expected", expected)
                .with_metric("r_squared", fit.r_squared)
                .with_metric("disparity", disp),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
