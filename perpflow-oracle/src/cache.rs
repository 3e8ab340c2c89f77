//! Bounded least-recently-used cache in front of a rate source.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

use crate::source::RateSource;

type Key = (String, DateTime<Utc>);

/// Values plus a recency index: `recency` maps last-use tick to key, so the
/// first entry is always the eviction candidate.
#[derive(Debug, Default)]
struct Lru {
    entries: HashMap<Key, (f64, u64)>,
    recency: BTreeMap<u64, Key>,
    clock: u64,
}

impl Lru {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn touch(&mut self, key: &Key) -> Option<f64> {
        let now = self.tick();
        let (value, used) = self.entries.get_mut(key)?;
        let previous = std::mem::replace(used, now);
        let value = *value;
        self.recency.remove(&previous);
        self.recency.insert(now, key.clone());
        Some(value)
    }

    fn insert(&mut self, key: Key, value: f64, capacity: usize) {
        let existing = self.entries.get(&key).map(|(_, used)| *used);
        match existing {
            Some(used) => {
                self.recency.remove(&used);
            }
            None if self.entries.len() >= capacity => {
                if let Some((_, oldest)) = self.recency.pop_first() {
                    self.entries.remove(&oldest);
                }
            }
            None => {}
        }
        let now = self.tick();
        self.recency.insert(now, key.clone());
        self.entries.insert(key, (value, now));
    }
}

/// Wraps any [`RateSource`] with a bounded LRU keyed by `(ticker, as_of)`.
///
/// Only hits are cached; unsupported tickers always reach the inner source.
/// A capacity of zero disables caching.
#[derive(Debug)]
pub struct CachedSource<S> {
    inner: S,
    capacity: usize,
    lru: Mutex<Lru>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: RateSource> CachedSource<S> {
    pub fn new(inner: S, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            lru: Mutex::new(Lru::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `(hits, misses)` since construction.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Lru> {
        // A poisoned cache is still a valid cache: entries are only ever
        // values the inner source returned.
        self.lru.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S: RateSource> RateSource for CachedSource<S> {
    fn rate(&self, ticker: &str, as_of: DateTime<Utc>) -> Option<f64> {
        if self.capacity == 0 {
            return self.inner.rate(ticker, as_of);
        }

        let key = (ticker.to_string(), as_of);
        if let Some(value) = self.lock().touch(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(ticker, %as_of, value, "rate cache hit");
            return Some(value);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = self.inner.rate(ticker, as_of)?;
        self.lock().insert(key, value, self.capacity);
        Some(value)
    }

    fn tickers(&self) -> Vec<String> {
        self.inner.tickers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FixedTable;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 0, minute, 0).unwrap()
    }

    #[test]
    fn repeated_query_hits_cache() {
        let cache = CachedSource::new(FixedTable::demo_prices(), 4);
        assert_eq!(cache.rate("BTC", at(0)), Some(35_000.0));
        assert_eq!(cache.rate("BTC", at(0)), Some(35_000.0));
        assert_eq!(cache.stats(), (1, 1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn misses_are_not_cached() {
        let cache = CachedSource::new(FixedTable::demo_prices(), 4);
        assert_eq!(cache.rate("DOGE", at(0)), None);
        assert_eq!(cache.rate("DOGE", at(0)), None);
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), (0, 2));
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = CachedSource::new(FixedTable::demo_prices(), 2);
        cache.rate("BTC", at(0));
        cache.rate("ETH", at(0));
        // Touch BTC so ETH becomes the eviction candidate.
        cache.rate("BTC", at(0));
        cache.rate("UNI", at(0));
        assert_eq!(cache.len(), 2);

        let (hits_before, _) = cache.stats();
        cache.rate("BTC", at(0));
        assert_eq!(cache.stats().0, hits_before + 1);

        let (_, misses_before) = cache.stats();
        assert_eq!(cache.rate("ETH", at(0)), Some(2_200.5));
        assert_eq!(cache.stats().1, misses_before + 1);
    }

    #[test]
    fn eviction_never_changes_answers() {
        let uncached = FixedTable::demo_prices();
        let cache = CachedSource::new(FixedTable::demo_prices(), 1);
        for minute in 0..10 {
            for ticker in ["BTC", "ETH", "UNI", "DOGE"] {
                assert_eq!(cache.rate(ticker, at(minute)), uncached.rate(ticker, at(minute)));
            }
        }
        assert!(cache.len() <= 1);
    }

    #[test]
    fn recency_index_tracks_entries() {
        let mut lru = Lru::default();
        let key = |t: &str| (t.to_string(), at(0));
        lru.insert(key("BTC"), 1.0, 2);
        lru.insert(key("ETH"), 2.0, 2);
        lru.insert(key("BTC"), 1.5, 2);
        assert_eq!(lru.touch(&key("ETH")), Some(2.0));
        lru.insert(key("UNI"), 3.0, 2);

        assert_eq!(lru.entries.len(), 2);
        assert_eq!(lru.recency.len(), 2);
        assert!(!lru.entries.contains_key(&key("BTC")));
        assert_eq!(lru.recency.values().cloned().collect::<Vec<_>>(), vec![key("ETH"), key("UNI")]);
    }

    #[test]
    fn zero_capacity_passes_through() {
        let cache = CachedSource::new(FixedTable::demo_prices(), 0);
        assert_eq!(cache.rate("BTC", at(0)), Some(35_000.0));
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), (0, 0));
    }
}
