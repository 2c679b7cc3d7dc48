//! Shared types for the KRXSCAN pipeline.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that provider, predicate,
//! and engine modules can depend on them without circular references.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Market & Instrument
// ---------------------------------------------------------------------------

/// Primary listing venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
    Kospi,
    Kosdaq,
}

impl Market {
    /// All known venues (useful for iteration).
    pub const ALL: &'static [Market] = &[Market::Kospi, Market::Kosdaq];

    /// Venue code as the data provider expects it.
    pub fn code(&self) -> &'static str {
        match self {
            Market::Kospi => "KOSPI",
            Market::Kosdaq => "KOSDAQ",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Attempt to parse a string into a Market (case-insensitive).
impl std::str::FromStr for Market {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kospi" => Ok(Market::Kospi),
            "kosdaq" => Ok(Market::Kosdaq),
            _ => Err(anyhow::anyhow!("Unknown market: {s}")),
        }
    }
}

/// A listed instrument (stock or ETF). Immutable for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    /// Ticker code, e.g. "005930".
    pub code: String,
    /// Display name, e.g. "삼성전자".
    pub name: String,
    pub market: Market,
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.code, self.market)
    }
}

impl Instrument {
    /// Helper to build a test instrument with sensible defaults.
    pub fn sample(code: &str, name: &str) -> Self {
        Instrument {
            code: code.to_string(),
            name: name.to_string(),
            market: Market::Kospi,
        }
    }
}

// ---------------------------------------------------------------------------
// Price & flow history
// ---------------------------------------------------------------------------

/// One day of OHLCV history. Sequences are ascending by date and never
/// mutated after the provider returns them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Trade value in KRW. Not every endpoint reports it.
    #[serde(default)]
    pub value: Option<f64>,
}

impl Candle {
    /// Day-over-day close change vs a previous candle, as a percentage.
    pub fn change_pct_from(&self, prev: &Candle) -> f64 {
        if prev.close == 0.0 {
            return 0.0;
        }
        (self.close / prev.close - 1.0) * 100.0
    }
}

/// Net purchase amounts by investor category for one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRecord {
    pub date: NaiveDate,
    /// Institutional net purchase in KRW (buy minus sell).
    pub institutional: f64,
    /// Foreign net purchase in KRW.
    pub foreign: f64,
}

/// One row of a whole-market daily snapshot (used by the gainer scan).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub code: String,
    pub name: String,
    pub close: f64,
    /// Provider-supplied day-over-day change (%), when available.
    #[serde(default)]
    pub change_pct: Option<f64>,
    /// Trade value in KRW.
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Scan results
// ---------------------------------------------------------------------------

/// Sort direction for the ranking key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Smallest first — e.g. "closest to the support line".
    Ascending,
    /// Largest first — e.g. "strongest gain".
    Descending,
}

/// Net flow summary attached to a result for display annotation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FlowSummary {
    pub institutional: f64,
    pub foreign: f64,
}

impl FlowSummary {
    /// Qualitative icon: both categories net-buying, one, or neither.
    pub fn icon(&self) -> &'static str {
        match (self.institutional > 0.0, self.foreign > 0.0) {
            (true, true) => "🟢",
            (true, false) | (false, true) => "🟡",
            (false, false) => "⚪",
        }
    }
}

/// One instrument that passed every configured filter stage this run.
/// Ephemeral: held in memory for the duration of one run only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub instrument: Instrument,
    /// Metric name → computed value, for display.
    pub metrics: BTreeMap<String, f64>,
    /// The value results are ranked by.
    pub rank_key: f64,
    /// Net flow annotation, when the predicate fetched it.
    #[serde(default)]
    pub flow: Option<FlowSummary>,
}

impl ScanResult {
    pub fn new(instrument: Instrument, rank_key: f64) -> Self {
        ScanResult {
            instrument,
            metrics: BTreeMap::new(),
            rank_key,
            flow: None,
        }
    }

    /// Record a display metric.
    pub fn with_metric(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

// ---------------------------------------------------------------------------
// Skip taxonomy
// ---------------------------------------------------------------------------

/// Expected, per-instrument reasons to exclude an instrument from a scan.
///
/// These are the failure kinds the scanner deliberately suppresses at the
/// instrument boundary so one bad instrument never aborts the batch.
/// Anything else surfaces in the error log, distinguishable from "no match".
#[derive(Debug, thiserror::Error)]
pub enum ScanSkip {
    #[error("provider returned no data for the instrument")]
    MissingData,

    #[error("insufficient history: {have} bars, need {need}")]
    InsufficientHistory { have: usize, need: usize },

    /// Provider/network failure while fetching this instrument.
    #[error("provider error: {0}")]
    Provider(#[from] anyhow::Error),
}

impl ScanSkip {
    /// Whether this is an expected data-quality skip (logged at debug)
    /// rather than an infrastructure failure (logged at warn).
    pub fn is_expected(&self) -> bool {
        !matches!(self, ScanSkip::Provider(_))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
