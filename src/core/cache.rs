//! Position continuity cache: resting positions keyed by `(time_index, id)`.
//!
//! There is no lookup by id alone. A position resolved for one period never
//! seeds another period's layout.

use bevy::math::Vec2;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ContinuityCache {
    periods: HashMap<usize, HashMap<String, Vec2>>,
}

impl ContinuityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, time_index: usize, id: &str) -> Option<Vec2> {
        self.periods.get(&time_index)?.get(id).copied()
    }

    pub fn set(&mut self, time_index: usize, id: impl Into<String>, position: Vec2) {
        self.periods
            .entry(time_index)
            .or_default()
            .insert(id.into(), position);
    }

    pub fn contains(&self, time_index: usize, id: &str) -> bool {
        self.get(time_index, id).is_some()
    }

    /// Number of entries stored for one period.
    pub fn period_len(&self, time_index: usize) -> usize {
        self.periods.get(&time_index).map_or(0, HashMap::len)
    }

    pub fn len(&self) -> usize {
        self.periods.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_isolated_per_period() {
        let mut cache = ContinuityCache::new();
        cache.set(0, "AAPL", Vec2::new(10.0, 20.0));
        assert_eq!(cache.get(0, "AAPL"), Some(Vec2::new(10.0, 20.0)));
        assert_eq!(cache.get(1, "AAPL"), None);
        assert!(!cache.contains(1, "AAPL"));
    }

    #[test]
    fn writing_one_period_leaves_others_untouched() {
        let mut cache = ContinuityCache::new();
        cache.set(1, "AAPL", Vec2::new(5.0, 5.0));
        cache.set(0, "AAPL", Vec2::new(10.0, 20.0));
        assert_eq!(cache.get(1, "AAPL"), Some(Vec2::new(5.0, 5.0)));
        cache.set(0, "AAPL", Vec2::new(11.0, 21.0));
        assert_eq!(cache.get(0, "AAPL"), Some(Vec2::new(11.0, 21.0)));
        assert_eq!(cache.get(1, "AAPL"), Some(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn counts() {
        let mut cache = ContinuityCache::new();
        assert!(cache.is_empty());
        cache.set(0, "A", Vec2::ZERO);
        cache.set(0, "B", Vec2::ZERO);
        cache.set(3, "A", Vec2::ZERO);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.period_len(0), 2);
        assert_eq!(cache.period_len(3), 1);
        assert_eq!(cache.period_len(7), 0);
    }
}
