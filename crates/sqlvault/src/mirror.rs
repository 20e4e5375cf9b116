//! In-memory mirror of the backing table

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The values of one context, keyed by element key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextRecord {
    elements: HashMap<i64, String>,
}

impl ContextRecord {
    pub fn elements(&self) -> &HashMap<i64, String> {
        &self.elements
    }
}

/// Two-level map from context key to [`ContextRecord`], mutated only under
/// its guard. The guard is held for the in-memory update alone; callers do
/// their database round-trip first, then touch the mirror.
///
/// Everything handed out is an independent clone; nothing a caller receives
/// aliases the live map.
#[derive(Debug, Default)]
pub(crate) struct Mirror {
    records: Mutex<HashMap<i64, ContextRecord>>,
}

impl Mirror {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite one element, creating the context record lazily.
    /// Used both by the write-through save path and by the load drain.
    pub(crate) fn upsert(&self, context_key: i64, element_key: i64, value: String) {
        self.lock()
            .entry(context_key)
            .or_default()
            .elements
            .insert(element_key, value);
    }

    pub(crate) fn get(&self, context_key: i64, element_key: i64) -> Option<String> {
        self.lock()
            .get(&context_key)
            .and_then(|record| record.elements.get(&element_key))
            .cloned()
    }

    pub(crate) fn context_elements(&self, context_key: i64) -> Option<HashMap<i64, String>> {
        self.lock()
            .get(&context_key)
            .map(|record| record.elements.clone())
    }

    pub(crate) fn snapshot(&self) -> HashMap<i64, ContextRecord> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, ContextRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_creates_context_lazily() {
        let mirror = Mirror::new();
        assert_eq!(mirror.get(1, 1), None);

        mirror.upsert(1, 1, "a".to_string());
        assert_eq!(mirror.get(1, 1), Some("a".to_string()));

        // second element in the same context
        mirror.upsert(1, 2, "b".to_string());
        let elements = mirror.context_elements(1).unwrap();
        assert_eq!(elements.len(), 2);
    }

    #[test]
    fn upsert_overwrites_existing_element() {
        let mirror = Mirror::new();
        mirror.upsert(7, 3, "old".to_string());
        mirror.upsert(7, 3, "new".to_string());
        assert_eq!(mirror.get(7, 3), Some("new".to_string()));
        assert_eq!(mirror.context_elements(7).unwrap().len(), 1);
    }

    #[test]
    fn missing_context_and_missing_element_are_distinct_lookups() {
        let mirror = Mirror::new();
        mirror.upsert(7, 3, "hello".to_string());
        assert_eq!(mirror.get(8, 3), None);
        assert_eq!(mirror.get(7, 99), None);
        assert!(mirror.context_elements(8).is_none());
    }

    #[test]
    fn snapshot_is_independent_of_the_live_map() {
        let mirror = Mirror::new();
        mirror.upsert(1, 1, "a".to_string());

        let mut snapshot = mirror.snapshot();
        snapshot.remove(&1);
        let mut elements = mirror.context_elements(1).unwrap();
        elements.insert(9, "stray".to_string());

        assert_eq!(mirror.get(1, 1), Some("a".to_string()));
        assert_eq!(mirror.get(1, 9), None);
    }
}
