//! Name-keyed collection registry (`spec.md` §4.6).

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::store::VectorStore;

/// Name under which a default, always-present collection is reserved
/// (`spec.md` §4.6).
pub const DEFAULT_COLLECTION: &str = "default";

/// Maps collection names to their [`VectorStore`]. Creation/deletion is
/// single-writer, guarded by one [`RwLock`] over the whole map (`spec.md`
/// §5); once created, a collection's own internal locking lets reads and
/// writes against it proceed independently of the registry lock.
pub struct CollectionRegistry {
    collections: RwLock<FxHashMap<String, Arc<VectorStore>>>,
    default_config: Config,
    metrics: Arc<dyn Metrics>,
}

impl CollectionRegistry {
    /// Creates a registry with an eagerly-created `"default"` collection,
    /// using `config` as the template for every collection it creates.
    #[must_use]
    pub fn new(config: Config, metrics: Arc<dyn Metrics>) -> Self {
        let registry = Self {
            collections: RwLock::new(FxHashMap::default()),
            default_config: config,
            metrics,
        };
        registry.collections.write().insert(
            DEFAULT_COLLECTION.to_string(),
            Arc::new(VectorStore::with_metrics(
                &registry.default_config,
                Arc::clone(&registry.metrics),
            )),
        );
        registry
    }

    /// Creates a new, empty collection named `name`.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateId`] if `name` already exists.
    pub fn create(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(Error::DuplicateId(name.to_string()));
        }
        collections.insert(
            name.to_string(),
            Arc::new(VectorStore::with_metrics(&self.default_config, Arc::clone(&self.metrics))),
        );
        Ok(())
    }

    /// Returns a handle to the collection named `name`, if it exists.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<VectorStore>> {
        self.collections.read().get(name).cloned()
    }

    /// Deletes the collection named `name`.
    ///
    /// # Errors
    ///
    /// [`Error::State`] for `"default"`, which can never be deleted.
    /// [`Error::NotFound`] if `name` does not exist.
    pub fn delete(&self, name: &str) -> Result<()> {
        if name == DEFAULT_COLLECTION {
            return Err(Error::State("the default collection cannot be deleted".into()));
        }
        let mut collections = self.collections.write();
        if collections.remove(name).is_none() {
            return Err(Error::NotFound(name.to_string()));
        }
        Ok(())
    }

    /// `true` if a collection named `name` exists.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.collections.read().contains_key(name)
    }

    /// Lists every collection name, including `"default"`.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.collections.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::NoopMetrics;

    fn registry() -> CollectionRegistry {
        CollectionRegistry::new(Config::default(), Arc::new(NoopMetrics))
    }

    #[test]
    fn default_collection_exists_on_creation() {
        let registry = registry();
        assert!(registry.exists(DEFAULT_COLLECTION));
        assert!(registry.get(DEFAULT_COLLECTION).is_some());
    }

    #[test]
    fn create_then_get_round_trips() {
        let registry = registry();
        registry.create("docs").unwrap();
        assert!(registry.get("docs").is_some());
    }

    #[test]
    fn create_rejects_duplicate_name() {
        let registry = registry();
        registry.create("docs").unwrap();
        let err = registry.create("docs").unwrap_err();
        assert!(matches!(err, Error::DuplicateId(_)));
    }

    #[test]
    fn default_collection_cannot_be_deleted() {
        let registry = registry();
        let err = registry.delete(DEFAULT_COLLECTION).unwrap_err();
        assert!(matches!(err, Error::State(_)));
    }

    #[test]
    fn delete_unknown_collection_is_not_found() {
        let registry = registry();
        let err = registry.delete("ghost").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn list_includes_default_and_created_collections() {
        let registry = registry();
        registry.create("docs").unwrap();
        let mut names = registry.list();
        names.sort();
        assert_eq!(names, vec!["default".to_string(), "docs".to_string()]);
    }
}
