//! Bounded per-meal price history derived from market polls.
//!
//! Each meal gets a FIFO buffer of (timestamp, price) observations capped
//! at [`HISTORY_CAPACITY`]. Buffers are created lazily on the first
//! observation and live for the process lifetime; meals that drop out of
//! the snapshot keep their buffer, they just stop receiving samples.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};

/// Maximum observations retained per meal
pub const HISTORY_CAPACITY: usize = 20;

/// One (timestamp, price) sample taken from a market poll
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceObservation {
    pub time: DateTime<Utc>,
    pub price: f64,
}

/// Per-meal price history buffers, keyed by meal name
#[derive(Debug, Default)]
pub struct PriceHistoryStore {
    buffers: HashMap<String, VecDeque<PriceObservation>>,
}

impl PriceHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observation for `name`, trimming the buffer to capacity.
    ///
    /// A missing or non-positive price is a strict no-op: gaps in polling
    /// produce gaps in time spacing, never synthetic points.
    pub fn record(&mut self, name: &str, price: Option<f64>, time: DateTime<Utc>) {
        let Some(price) = price.filter(|p| p.is_finite() && *p > 0.0) else {
            return;
        };

        let buffer = self
            .buffers
            .entry(name.to_string())
            .or_insert_with(|| VecDeque::with_capacity(HISTORY_CAPACITY));

        buffer.push_back(PriceObservation { time, price });
        while buffer.len() > HISTORY_CAPACITY {
            buffer.pop_front();
        }
    }

    /// Ordered observations for `name`, oldest first; empty when unknown
    pub fn history(&self, name: &str) -> Vec<PriceObservation> {
        self.buffers
            .get(name)
            .map(|buffer| buffer.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Observation count for `name`
    pub fn len(&self, name: &str) -> usize {
        self.buffers.get(name).map(VecDeque::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Number of meals with at least one observation
    pub fn tracked(&self) -> usize {
        self.buffers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_capacity_is_fifo() {
        let mut store = PriceHistoryStore::new();
        for i in 0..50 {
            store.record("Beef Stew", Some(100.0 + i as f64), ts(i));
        }

        let history = store.history("Beef Stew");
        assert_eq!(history.len(), HISTORY_CAPACITY);
        // Exactly the last 20, oldest first
        assert_eq!(history[0].price, 130.0);
        assert_eq!(history[19].price, 149.0);
    }

    #[test]
    fn test_missing_observation_is_noop() {
        let mut store = PriceHistoryStore::new();
        store.record("Turkey Dogs", Some(4.0), ts(0));
        store.record("Turkey Dogs", None, ts(5));
        store.record("Turkey Dogs", Some(f64::NAN), ts(10));
        store.record("Turkey Dogs", Some(-1.0), ts(15));
        store.record("Turkey Dogs", Some(0.0), ts(20));

        assert_eq!(store.len("Turkey Dogs"), 1);
    }

    #[test]
    fn test_lazy_creation() {
        let mut store = PriceHistoryStore::new();
        assert!(store.is_empty());

        // A no-op record must not create a buffer
        store.record("Lamb Gyro", None, ts(0));
        assert_eq!(store.tracked(), 0);

        store.record("Lamb Gyro", Some(6.0), ts(5));
        assert_eq!(store.tracked(), 1);
    }

    #[test]
    fn test_unknown_meal_is_empty() {
        let store = PriceHistoryStore::new();
        assert!(store.history("Scrambled Eggs").is_empty());
        assert_eq!(store.len("Scrambled Eggs"), 0);
    }

    #[test]
    fn test_buffers_survive_quiet_polls() {
        let mut store = PriceHistoryStore::new();
        store.record("Corned Beef", Some(8.0), ts(0));

        // Meal disappears from subsequent snapshots: nothing recorded,
        // nothing pruned
        for i in 1..10 {
            store.record("Beef Stew", Some(5.0), ts(i * 5));
        }
        assert_eq!(store.len("Corned Beef"), 1);
        assert_eq!(store.history("Corned Beef")[0].price, 8.0);
    }
}
