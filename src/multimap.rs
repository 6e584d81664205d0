//! Ordered multimap used to group remapped judgments by query.

use std::collections::{BTreeMap, btree_map};

/// A map from each key to the list of values inserted under it.
///
/// Values under one key keep insertion order. Keys iterate in ascending
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMultiMap<K, V> {
    inner: BTreeMap<K, Vec<V>>,
}

impl<K: Ord, V> OrderedMultiMap<K, V> {
    pub fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }

    /// Append `value` to the list stored under `key`.
    pub fn insert(&mut self, key: K, value: V) {
        self.inner.entry(key).or_default().push(value);
    }

    /// Values under `key` in insertion order, or an empty slice.
    pub fn get<Q>(&self, key: &Q) -> &[V]
    where
        K: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.inner.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Total number of values across all keys.
    pub fn value_count(&self) -> usize {
        self.inner.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, K, Vec<V>> {
        self.inner.iter()
    }
}

impl<K: Ord, V> Default for OrderedMultiMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K, V> IntoIterator for &'a OrderedMultiMap<K, V> {
    type Item = (&'a K, &'a Vec<V>);
    type IntoIter = btree_map::Iter<'a, K, Vec<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_keep_insertion_order() {
        let mut map = OrderedMultiMap::new();
        map.insert("q1", 3);
        map.insert("q1", 1);
        map.insert("q1", 2);

        assert_eq!(map.get("q1"), &[3, 1, 2]);
    }

    #[test]
    fn keys_iterate_ascending() {
        let mut map = OrderedMultiMap::new();
        map.insert("q2".to_string(), 'a');
        map.insert("q10".to_string(), 'b');
        map.insert("q1".to_string(), 'c');

        let keys: Vec<_> = map.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["q1", "q10", "q2"]);
    }

    #[test]
    fn missing_key_is_empty() {
        let map: OrderedMultiMap<String, u32> = OrderedMultiMap::new();
        assert!(map.get("absent").is_empty());
        assert!(!map.contains_key("absent"));
        assert!(map.is_empty());
    }

    #[test]
    fn counts() {
        let mut map = OrderedMultiMap::new();
        map.insert(1, "a");
        map.insert(1, "b");
        map.insert(2, "c");

        assert_eq!(map.len(), 2);
        assert_eq!(map.value_count(), 3);
    }
}
