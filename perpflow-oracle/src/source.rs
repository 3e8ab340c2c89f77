//! Rate sources: where an authority gets the figure it attests.
//!
//! A source is a pure function of `(ticker, as_of)`: asking twice with the
//! same arguments must give the same answer, otherwise an attestation could
//! not be reproduced by anyone checking it later.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Pluggable lookup of a per-ticker figure (price or funding rate).
///
/// `None` means the ticker is not covered at `as_of`.
pub trait RateSource: Send + Sync {
    fn rate(&self, ticker: &str, as_of: DateTime<Utc>) -> Option<f64>;

    /// Tickers this source can ever answer for.
    fn tickers(&self) -> Vec<String>;
}

impl<S: RateSource + ?Sized> RateSource for Box<S> {
    fn rate(&self, ticker: &str, as_of: DateTime<Utc>) -> Option<f64> {
        (**self).rate(ticker, as_of)
    }

    fn tickers(&self) -> Vec<String> {
        (**self).tickers()
    }
}

// ── Fixed table ──────────────────────────────────────────────────────

/// One value per ticker, independent of time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedTable {
    rates: BTreeMap<String, f64>,
}

impl FixedTable {
    pub fn new<K: Into<String>>(rates: impl IntoIterator<Item = (K, f64)>) -> Self {
        Self {
            rates: rates.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Demo prices: BTC 35000, ETH 2200.5, UNI 17.5.
    pub fn demo_prices() -> Self {
        Self::new([("BTC", 35_000.0), ("ETH", 2_200.5), ("UNI", 17.5)])
    }

    /// Demo funding rates: 0.8 for BTC, ETH and UNI.
    pub fn demo_funding_rates() -> Self {
        Self::new([("BTC", 0.8), ("ETH", 0.8), ("UNI", 0.8)])
    }

    pub fn from_map(rates: BTreeMap<String, f64>) -> Self {
        Self { rates }
    }
}

impl RateSource for FixedTable {
    fn rate(&self, ticker: &str, _as_of: DateTime<Utc>) -> Option<f64> {
        self.rates.get(ticker).copied()
    }

    fn tickers(&self) -> Vec<String> {
        self.rates.keys().cloned().collect()
    }
}

// ── Scheduled table ──────────────────────────────────────────────────

/// Time-indexed values: the answer at `as_of` is the latest value effective
/// at or before it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduledTable {
    schedule: BTreeMap<String, BTreeMap<DateTime<Utc>, f64>>,
}

impl ScheduledTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ticker: impl Into<String>, effective: DateTime<Utc>, value: f64) {
        self.schedule
            .entry(ticker.into())
            .or_default()
            .insert(effective, value);
    }

    pub fn with(mut self, ticker: impl Into<String>, effective: DateTime<Utc>, value: f64) -> Self {
        self.insert(ticker, effective, value);
        self
    }
}

impl RateSource for ScheduledTable {
    fn rate(&self, ticker: &str, as_of: DateTime<Utc>) -> Option<f64> {
        self.schedule
            .get(ticker)?
            .range(..=as_of)
            .next_back()
            .map(|(_, v)| *v)
    }

    fn tickers(&self) -> Vec<String> {
        self.schedule.keys().cloned().collect()
    }
}
