// Candles grouped by interval for one trading pair
use shared::models::{Candle, Interval};
use std::collections::BTreeMap;

/// Built fresh by each fetch cycle or load. Candles keep the order they arrived
/// in; nothing here sorts or deduplicates.
#[derive(Debug, Clone, Default)]
pub struct IntervalDataset {
    pair: String,
    data: BTreeMap<Interval, Vec<Candle>>,
}

impl IntervalDataset {
    pub fn new(pair: impl Into<String>) -> Self {
        IntervalDataset {
            pair: pair.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    /// Replaces whatever was stored for `interval`.
    pub fn insert(&mut self, interval: Interval, candles: Vec<Candle>) {
        self.data.insert(interval, candles);
    }

    pub fn get(&self, interval: Interval) -> Option<&[Candle]> {
        self.data.get(&interval).map(Vec::as_slice)
    }

    pub fn contains(&self, interval: Interval) -> bool {
        self.data.contains_key(&interval)
    }

    /// Intervals present, shortest first.
    pub fn intervals(&self) -> Vec<Interval> {
        self.data.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Interval, &[Candle])> {
        self.data.iter().map(|(interval, candles)| (*interval, candles.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn total_candles(&self) -> usize {
        self.data.values().map(Vec::len).sum()
    }
}
