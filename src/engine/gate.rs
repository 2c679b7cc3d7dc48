//! Trading-calendar gate.
//!
//! Weekend days are closed outright. On weekdays the gate probes the
//! provider for today's record of a fixed, highly-liquid reference
//! instrument; an empty result means a holiday. Any provider error is
//! also treated as closed — skipping the run is safer than acting on
//! absent data.

use chrono::{Datelike, NaiveDate, Weekday};
use tracing::{info, warn};

use crate::provider::MarketDataProvider;

pub struct CalendarGate {
    reference_ticker: String,
}

impl CalendarGate {
    pub fn new(reference_ticker: &str) -> Self {
        Self {
            reference_ticker: reference_ticker.to_string(),
        }
    }

    /// Whether trading activity is expected on `today`.
    pub async fn is_market_open(
        &self,
        provider: &dyn MarketDataProvider,
        today: NaiveDate,
    ) -> bool {
        if matches!(today.weekday(), Weekday::Sat | Weekday::Sun) {
            info!(date = %today, "Weekend — market closed");
            return false;
        }

        match provider.ohlcv(&self.reference_ticker, today, today).await {
            Ok(candles) if candles.is_empty() => {
                info!(date = %today, "No reference data — treating as holiday");
                false
            }
            Ok(_) => true,
            Err(e) => {
                warn!(date = %today, error = %e, "Calendar probe failed — treating as closed");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockMarketDataProvider;
    use crate::types::Candle;

    fn probe_candle(date: NaiveDate) -> Candle {
        Candle {
            date,
            open: 70_000.0,
            high: 71_000.0,
            low: 69_500.0,
            close: 70_500.0,
            volume: 12_000_000.0,
            value: None,
        }
    }

    #[tokio::test]
    async fn test_weekend_closed_without_probe() {
        let gate = CalendarGate::new("005930");
        // No expectations set: any probe call would panic the mock.
        let provider = MockMarketDataProvider::new();
        let saturday = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();
        assert!(!gate.is_market_open(&provider, saturday).await);
        let sunday = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert!(!gate.is_market_open(&provider, sunday).await);
    }

    #[tokio::test]
    async fn test_weekday_with_data_open() {
        let gate = CalendarGate::new("005930");
        let mut provider = MockMarketDataProvider::new();
        provider
            .expect_ohlcv()
            .returning(|_, from, _| Ok(vec![probe_candle(from)]));
        let monday = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
        assert!(gate.is_market_open(&provider, monday).await);
    }

    #[tokio::test]
    async fn test_empty_probe_is_holiday() {
        let gate = CalendarGate::new("005930");
        let mut provider = MockMarketDataProvider::new();
        provider.expect_ohlcv().returning(|_, _, _| Ok(Vec::new()));
        let monday = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
        assert!(!gate.is_market_open(&provider, monday).await);
    }

    #[tokio::test]
    async fn test_probe_error_fails_safe() {
        let gate = CalendarGate::new("005930");
        let mut provider = MockMarketDataProvider::new();
        provider
            .expect_ohlcv()
            .returning(|_, _, _| Err(anyhow::anyhow!("gateway timeout")));
        let monday = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
        assert!(!gate.is_market_open(&provider, monday).await);
    }
}
