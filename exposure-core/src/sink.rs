//! Fact sinks
//!
//! A [`FactSink`] accumulates personalization facts. Emitting a value under a
//! key that is already present adds to the stored value instead of replacing it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::fact::{PersonalizationKey, PersonalizationValue};

/// Mergeable keyed store that receives emitted facts.
///
/// Implementations must be safe to call from many sessions in parallel.
pub trait FactSink: Send + Sync {
    /// Merge `value` into the entry for `key`, summing field-wise.
    fn emit(&self, key: PersonalizationKey, value: PersonalizationValue);
}

/// In-memory implementation of FactSink
///
/// Holds merged facts in a mutex-guarded map and counts raw emissions.
#[derive(Debug, Default)]
pub struct MemoryFactSink {
    facts: Mutex<HashMap<PersonalizationKey, PersonalizationValue>>,
    emissions: AtomicU64,
}

impl MemoryFactSink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn facts(&self) -> MutexGuard<'_, HashMap<PersonalizationKey, PersonalizationValue>> {
        // No entry is ever left half-merged, so a poisoned map is still usable.
        self.facts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merged value for a key, if any fact was emitted under it
    #[must_use]
    pub fn get(&self, key: &PersonalizationKey) -> Option<PersonalizationValue> {
        self.facts().get(key).copied()
    }

    /// Number of distinct keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.facts().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts().is_empty()
    }

    /// Total number of `emit` calls, before merging
    #[must_use]
    pub fn emissions(&self) -> u64 {
        self.emissions.load(Ordering::SeqCst)
    }

    /// All merged facts, sorted by key
    #[must_use]
    pub fn snapshot(&self) -> Vec<(PersonalizationKey, PersonalizationValue)> {
        let mut facts: Vec<_> = self
            .facts()
            .iter()
            .map(|(key, value)| (key.clone(), *value))
            .collect();
        facts.sort_by(|a, b| a.0.cmp(&b.0));
        facts
    }
}

impl FactSink for MemoryFactSink {
    fn emit(&self, key: PersonalizationKey, value: PersonalizationValue) {
        self.emissions.fetch_add(1, Ordering::SeqCst);
        *self.facts().entry(key).or_default() += value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RuleId, RuleSetId, TestId};
    use chrono::NaiveDate;
    use std::sync::Arc;
    use uuid::Uuid;

    fn key(rule: u128) -> PersonalizationKey {
        PersonalizationKey {
            test_set_id: TestId(Uuid::from_u128(1)),
            test_values: vec![0],
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            rule_set_id: RuleSetId(Uuid::from_u128(2)),
            rule_id: RuleId(Uuid::from_u128(rule)),
            is_default: true,
        }
    }

    #[test]
    fn equal_keys_accumulate() {
        let sink = MemoryFactSink::new();
        sink.emit(key(10), PersonalizationValue::single_visit(true, 4));
        sink.emit(key(10), PersonalizationValue::single_visit(false, 6));

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.emissions(), 2);
        assert_eq!(
            sink.get(&key(10)),
            Some(PersonalizationValue {
                visits: 2,
                visitors: 1,
                value: 10
            })
        );
    }

    #[test]
    fn distinct_keys_are_kept_apart() {
        let sink = MemoryFactSink::new();
        sink.emit(key(11), PersonalizationValue::single_visit(true, 1));
        sink.emit(key(10), PersonalizationValue::single_visit(true, 1));

        let snapshot = sink.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].0, key(10));
        assert_eq!(snapshot[1].0, key(11));
    }

    #[test]
    fn new_sink_is_empty() {
        let sink = MemoryFactSink::new();
        assert!(sink.is_empty());
        assert_eq!(sink.get(&key(1)), None);
    }

    #[test]
    fn concurrent_emits_are_all_merged() {
        let sink = Arc::new(MemoryFactSink::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        sink.emit(key(10), PersonalizationValue::single_visit(false, 1));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let merged = sink.get(&key(10)).unwrap();
        assert_eq!(merged.visits, 800);
        assert_eq!(merged.value, 800);
        assert_eq!(sink.emissions(), 800);
    }
}
