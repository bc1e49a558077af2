//! Sparse `id -> Location` membership map (`spec.md` §3, §9).
//!
//! A compact `HashMap<String, Location>` stands in for the "dictionaries of
//! dictionaries" pattern `spec.md` §9 flags for replacement; ownership is
//! single-writer (guarded by the enclosing [`crate::store::VectorStore`]),
//! so no internal locking is needed here.

use rustc_hash::FxHashMap;

/// Where a live id currently resides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Currently sitting in the write buffer (looked up by id, not index:
    /// the buffer compacts via swap-remove on delete, so a fixed slot index
    /// would go stale the moment a different id is removed).
    Buffer,
    /// Node index inside the graph.
    Indexed(u32),
}

/// Sparse map from id to its current [`Location`].
#[derive(Debug, Default)]
pub struct IdMap {
    locations: FxHashMap<String, Location>,
}

impl IdMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the location of `id`, if it exists.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Location> {
        self.locations.get(id).copied()
    }

    /// Returns `true` if `id` has exactly one recorded location.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.locations.contains_key(id)
    }

    /// Records (or overwrites) the location of `id`.
    pub fn insert(&mut self, id: String, location: Location) {
        self.locations.insert(id, location);
    }

    /// Removes `id`, returning its previous location if present.
    pub fn remove(&mut self, id: &str) -> Option<Location> {
        self.locations.remove(id)
    }

    /// Number of live ids tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// `true` if no ids are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Clears all entries.
    pub fn clear(&mut self) {
        self.locations.clear();
    }

    /// Iterates over `(id, location)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Location)> {
        self.locations.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get_round_trips() {
        let mut map = IdMap::new();
        map.insert("a".to_string(), Location::Buffer);
        assert_eq!(map.get("a"), Some(Location::Buffer));
        assert!(map.contains("a"));
    }

    #[test]
    fn remove_drops_location() {
        let mut map = IdMap::new();
        map.insert("a".to_string(), Location::Indexed(5));
        assert_eq!(map.remove("a"), Some(Location::Indexed(5)));
        assert!(!map.contains("a"));
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn overwrite_updates_location() {
        let mut map = IdMap::new();
        map.insert("a".to_string(), Location::Buffer);
        map.insert("a".to_string(), Location::Indexed(1));
        assert_eq!(map.get("a"), Some(Location::Indexed(1)));
        assert_eq!(map.len(), 1);
    }
}
