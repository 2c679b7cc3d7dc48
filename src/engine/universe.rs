//! Universe builder.
//!
//! Fetches the market-cap ranking of each configured venue, truncates
//! to the configured depth, de-duplicates across venues preserving the
//! provider's rank order, and applies the ETF/ETN and name-keyword
//! exclusions. A venue that fails to fetch contributes nothing; the
//! run proceeds with whatever other venues succeeded.

use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::config::UniverseConfig;
use crate::provider::MarketDataProvider;
use crate::types::{Instrument, Market};

pub struct UniverseBuilder {
    markets: Vec<Market>,
    depth: usize,
    exclude_etf: bool,
    exclude_keywords: Vec<String>,
}

impl UniverseBuilder {
    pub fn new(cfg: &UniverseConfig) -> anyhow::Result<Self> {
        let markets = cfg
            .markets
            .iter()
            .map(|m| m.parse::<Market>())
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self {
            markets,
            depth: cfg.depth,
            exclude_etf: cfg.exclude_etf,
            exclude_keywords: cfg.exclude_keywords.clone(),
        })
    }

    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    /// Build the de-duplicated, filtered universe for the snapshot date.
    pub async fn build(
        &self,
        provider: &dyn MarketDataProvider,
        date: NaiveDate,
    ) -> Vec<Instrument> {
        let etf_codes: HashSet<String> = if self.exclude_etf {
            match provider.etf_tickers(date).await {
                Ok(codes) => codes.into_iter().collect(),
                Err(e) => {
                    warn!(error = %e, "ETF listing fetch failed — exclusion disabled this run");
                    HashSet::new()
                }
            }
        } else {
            HashSet::new()
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut universe = Vec::new();

        for &market in &self.markets {
            let ranked = match provider.market_cap_ranking(date, market).await {
                Ok(r) => r,
                Err(e) => {
                    warn!(%market, error = %e, "Ranking fetch failed — skipping venue");
                    continue;
                }
            };

            let mut kept = 0usize;
            for inst in ranked.into_iter().take(self.depth) {
                if !seen.insert(inst.code.clone()) {
                    continue;
                }
                if etf_codes.contains(&inst.code) {
                    debug!(code = %inst.code, "Excluded: ETF/ETN");
                    continue;
                }
                if self
                    .exclude_keywords
                    .iter()
                    .any(|kw| inst.name.contains(kw.as_str()))
                {
                    debug!(code = %inst.code, name = %inst.name, "Excluded: keyword");
                    continue;
                }
                universe.push(inst);
                kept += 1;
            }
            info!(%market, kept, "Venue ranked and filtered");
        }

        universe
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockMarketDataProvider;
    use mockall::predicate::*;

    fn cfg(markets: &[&str], depth: usize) -> UniverseConfig {
        UniverseConfig {
            markets: markets.iter().map(|s| s.to_string()).collect(),
            depth,
            exclude_etf: false,
            exclude_keywords: Vec::new(),
        }
    }

    fn inst(code: &str, name: &str, market: Market) -> Instrument {
        Instrument {
            code: code.to_string(),
            name: name.to_string(),
            market,
        }
    }

    fn snapshot_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 31).unwrap()
    }

    #[test]
    fn test_unknown_market_rejected() {
        assert!(UniverseBuilder::new(&cfg(&["nasdaq"], 10)).is_err());
    }

    #[tokio::test]
    async fn test_depth_and_dedup() {
        let builder = UniverseBuilder::new(&cfg(&["kospi", "kosdaq"], 2)).unwrap();
        let mut provider = MockMarketDataProvider::new();
        provider
            .expect_market_cap_ranking()
            .with(always(), eq(Market::Kospi))
            .returning(|_, m| {
                Ok(vec![
                    inst("005930", "삼성전자", m),
                    inst("000660", "SK하이닉스", m),
                    inst("373220", "LG에너지솔루션", m), // beyond depth
                ])
            });
        provider
            .expect_market_cap_ranking()
            .with(always(), eq(Market::Kosdaq))
            .returning(|_, m| {
                Ok(vec![
                    inst("005930", "삼성전자", m), // duplicate across venues
                    inst("247540", "에코프로비엠", m),
                ])
            });

        let universe = builder.build(&provider, snapshot_date()).await;
        let codes: Vec<&str> = universe.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["005930", "000660", "247540"]);
    }

    #[tokio::test]
    async fn test_failed_venue_degrades() {
        let builder = UniverseBuilder::new(&cfg(&["kospi", "kosdaq"], 10)).unwrap();
        let mut provider = MockMarketDataProvider::new();
        provider
            .expect_market_cap_ranking()
            .with(always(), eq(Market::Kospi))
            .returning(|_, _| Err(anyhow::anyhow!("gateway down")));
        provider
            .expect_market_cap_ranking()
            .with(always(), eq(Market::Kosdaq))
            .returning(|_, m| Ok(vec![inst("247540", "에코프로비엠", m)]));

        let universe = builder.build(&provider, snapshot_date()).await;
        assert_eq!(universe.len(), 1);
        assert_eq!(universe[0].code, "247540");
    }

    #[tokio::test]
    async fn test_etf_and_keyword_exclusion() {
        let mut config = cfg(&["kospi"], 10);
        config.exclude_etf = true;
        config.exclude_keywords = vec!["레버리지".to_string()];
        let builder = UniverseBuilder::new(&config).unwrap();

        let mut provider = MockMarketDataProvider::new();
        provider
            .expect_etf_tickers()
            .returning(|_| Ok(vec!["069500".to_string()]));
        provider.expect_market_cap_ranking().returning(|_, m| {
            Ok(vec![
                inst("005930", "삼성전자", m),
                inst("069500", "KODEX 200", m),
                inst("122630", "KODEX 레버리지", m),
            ])
        });

        let universe = builder.build(&provider, snapshot_date()).await;
        let codes: Vec<&str> = universe.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["005930"]);
    }
}
