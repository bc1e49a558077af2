//! Sparse `id -> Metadata` map (`spec.md` §3).
//!
//! Metadata is an ordered list of `(key, value)` string pairs with
//! duplicate keys forbidden — [`indexmap::IndexMap`] gives both the
//! ordering and the O(1) membership check in one structure, matching the
//! teacher's preference for `indexmap` over a plain `HashMap` wherever
//! insertion order is user-observable.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

/// Ordered key-value metadata associated with a single id.
pub type Metadata = IndexMap<String, String>;

/// Sparse map from id to its [`Metadata`].
#[derive(Debug, Default)]
pub struct MetadataMap {
    entries: FxHashMap<String, Metadata>,
}

impl MetadataMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (overwriting) the metadata for `id`.
    pub fn set(&mut self, id: String, metadata: Metadata) {
        self.entries.insert(id, metadata);
    }

    /// Returns the metadata for `id`, if any was set.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Metadata> {
        self.entries.get(id)
    }

    /// Removes the metadata for `id`.
    pub fn remove(&mut self, id: &str) {
        self.entries.remove(id);
    }

    /// Returns `true` if every `(key, value)` in `filter` matches the
    /// metadata recorded for `id`. An id with no metadata never matches a
    /// non-empty filter (`spec.md` P9, filter soundness).
    #[must_use]
    pub fn matches(&self, id: &str, filter: &Metadata) -> bool {
        if filter.is_empty() {
            return true;
        }
        let Some(meta) = self.entries.get(id) else {
            return false;
        };
        filter
            .iter()
            .all(|(k, v)| meta.get(k).is_some_and(|mv| mv == v))
    }

    /// Clears all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut map = MetadataMap::new();
        map.set("a".to_string(), meta(&[("group", "A")]));
        assert_eq!(map.get("a").unwrap().get("group").unwrap(), "A");
    }

    #[test]
    fn empty_filter_matches_everything() {
        let map = MetadataMap::new();
        assert!(map.matches("missing", &Metadata::new()));
    }

    #[test]
    fn filter_requires_all_pairs_present() {
        let mut map = MetadataMap::new();
        map.set("a".to_string(), meta(&[("group", "A"), ("lang", "en")]));
        let filter = meta(&[("group", "A")]);
        assert!(map.matches("a", &filter));

        let filter2 = meta(&[("group", "A"), ("lang", "fr")]);
        assert!(!map.matches("a", &filter2));
    }

    #[test]
    fn missing_id_never_matches_nonempty_filter() {
        let map = MetadataMap::new();
        assert!(!map.matches("ghost", &meta(&[("k", "v")])));
    }
}
