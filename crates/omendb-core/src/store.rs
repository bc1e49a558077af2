//! `VectorStore`: the per-collection coordinator routing writes through the
//! buffer and graph, and serving reads from both (`spec.md` §4.1).

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::buffer::VectorBuffer;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::graph::{GraphIndex, VamanaParams};
use crate::id_map::{IdMap, Location};
use crate::metadata::{Metadata, MetadataMap};
use crate::metrics::{Metrics, NoopMetrics};
use crate::quantization::{codec_for, QuantCodec, QuantizationMode};
use crate::storage::{PersistenceBinding, StoreSnapshot};

/// Storage form vectors are kept in, as reported by [`Stats`] (`spec.md`
/// §6 `stats().storage_mode`, grounded in the teacher's
/// `quantization::StorageMode` enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Full-precision `f32` storage.
    Full,
    /// 8-bit scalar quantization.
    Sq8,
    /// 1-bit binary quantization.
    Binary,
}

impl From<QuantizationMode> for StorageMode {
    fn from(mode: QuantizationMode) -> Self {
        match mode {
            QuantizationMode::None => Self::Full,
            QuantizationMode::Scalar => Self::Sq8,
            QuantizationMode::Binary => Self::Binary,
        }
    }
}

/// Point-in-time counters describing a store's contents (`spec.md` §4.1,
/// §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    /// Total live vectors (buffered plus indexed).
    pub count: usize,
    /// Live vectors still sitting in the write buffer.
    pub buffered: usize,
    /// Live vectors flushed into the graph.
    pub indexed: usize,
    /// Vector dimension, once known.
    pub dimension: Option<usize>,
    /// Active quantization mode.
    pub quantization: QuantizationMode,
    /// ANN algorithm in use. Only `"vamana"` is implemented.
    pub algorithm: &'static str,
    /// Storage form vectors are kept in, derived from `quantization`.
    pub storage_mode: StorageMode,
    /// Estimated bytes occupied by buffered vector payloads.
    pub buffer_bytes: usize,
    /// Estimated bytes occupied by the graph's vectors and adjacency lists.
    pub graph_bytes: usize,
    /// `buffer_bytes` in megabytes.
    pub mb_buffer: f64,
    /// `graph_bytes` in megabytes.
    pub mb_graph: f64,
    /// `buffer_bytes + graph_bytes` in megabytes.
    pub mb_total: f64,
}

/// Coordinates a single collection's write buffer, ANN graph, id/metadata
/// maps, and persistence binding.
///
/// A direct [`Self::add`] is written straight to the graph; [`Self::add_batch`]
/// lands in the [`VectorBuffer`] first and is flushed into the graph once it
/// fills (`spec.md` §4.1, §4.2).
pub struct VectorStore {
    dimension: RwLock<Option<usize>>,
    codec: RwLock<Box<dyn QuantCodec>>,
    buffer: RwLock<VectorBuffer>,
    graph: RwLock<GraphIndex>,
    ids: RwLock<IdMap>,
    metadata: RwLock<MetadataMap>,
    persistence: RwLock<Option<Box<dyn PersistenceBinding>>>,
    max_vectors: usize,
    metrics: Arc<dyn Metrics>,
}

impl VectorStore {
    /// Creates a store from `config`, discarding metrics events.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_metrics(config, Arc::new(NoopMetrics))
    }

    /// Creates a store from `config`, routing counters to `metrics`.
    #[must_use]
    pub fn with_metrics(config: &Config, metrics: Arc<dyn Metrics>) -> Self {
        Self {
            dimension: RwLock::new(None),
            codec: RwLock::new(codec_for(config.quantization)),
            buffer: RwLock::new(VectorBuffer::new(config.buffer_size)),
            graph: RwLock::new(GraphIndex::new(VamanaParams::default())),
            ids: RwLock::new(IdMap::new()),
            metadata: RwLock::new(MetadataMap::new()),
            persistence: RwLock::new(None),
            max_vectors: config.max_vectors,
            metrics,
        }
    }

    fn validate_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.is_empty() {
            return Err(Error::Validation("vector must not be empty".into()));
        }
        let mut dim = self.dimension.write();
        match *dim {
            Some(d) if d != vector.len() => Err(Error::Validation(format!(
                "dimension mismatch: expected {d}, got {}",
                vector.len()
            ))),
            Some(_) => Ok(()),
            None => {
                *dim = Some(vector.len());
                Ok(())
            }
        }
    }

    fn check_capacity(&self) -> Result<()> {
        if self.ids.read().len() >= self.max_vectors {
            return Err(Error::Capacity {
                limit: self.max_vectors,
            });
        }
        Ok(())
    }

    /// Inserts `vector` under `id` directly into the graph (`spec.md` §4.1).
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an empty vector or a dimension mismatch,
    /// [`Error::DuplicateId`] if `id` is already live, [`Error::Capacity`]
    /// once `max_vectors` live ids are reached.
    pub fn add(&self, id: String, vector: Vec<f32>, metadata: Option<Metadata>) -> Result<()> {
        self.validate_dimension(&vector)?;
        if self.ids.read().contains(&id) {
            return Err(Error::DuplicateId(id));
        }
        self.check_capacity()?;

        let encoded = self.codec.read().encode(&vector);
        let node = self.graph.read().add(id.clone(), encoded);
        self.ids.write().insert(id.clone(), Location::Indexed(node));
        self.metadata.write().set(id, metadata.unwrap_or_default());
        self.metrics.record_insert();
        Ok(())
    }

    /// Inserts a batch of `(id, vector, metadata)` items through the write
    /// buffer, flushing into the graph whenever the buffer fills. Invalid
    /// items (empty vector, dimension mismatch, duplicate id, at-capacity)
    /// are skipped; returns the number actually added.
    ///
    /// # Errors
    ///
    /// Only for failures unrelated to any individual item, e.g. a flush
    /// that hits a persistence error.
    pub fn add_batch(&self, items: Vec<(String, Vec<f32>, Option<Metadata>)>) -> Result<usize> {
        let mut added = 0;
        for (id, vector, metadata) in items {
            if self.insert_buffered(id, vector, metadata).is_ok() {
                added += 1;
            }
            if self.buffer.read().is_full() {
                self.flush()?;
            }
        }
        Ok(added)
    }

    fn insert_buffered(&self, id: String, vector: Vec<f32>, metadata: Option<Metadata>) -> Result<()> {
        self.validate_dimension(&vector)?;
        if self.ids.read().contains(&id) {
            return Err(Error::DuplicateId(id));
        }
        self.check_capacity()?;

        let encoded = self.codec.read().encode(&vector);
        self.buffer.write().add_batch(vec![(id.clone(), encoded)]);
        self.ids.write().insert(id.clone(), Location::Buffer);
        self.metadata.write().set(id, metadata.unwrap_or_default());
        self.metrics.record_insert();
        Ok(())
    }

    /// Moves every buffered vector into the graph.
    ///
    /// # Errors
    ///
    /// Never fails on its own; returns `Result` for symmetry with other
    /// lifecycle operations.
    pub fn flush(&self) -> Result<()> {
        let items = self.buffer.write().drain();
        if items.is_empty() {
            return Ok(());
        }
        let count = items.len();
        let graph = self.graph.read();
        let mut ids = self.ids.write();
        for (id, vector) in items {
            let node = graph.add(id.clone(), vector);
            ids.insert(id, Location::Indexed(node));
        }
        drop(ids);
        drop(graph);
        self.metrics.record_flush(count);
        Ok(())
    }

    /// Deletes `id`, wherever it currently lives. Returns `true` if it was
    /// present.
    pub fn delete(&self, id: &str) -> bool {
        let location = self.ids.write().remove(id);
        match location {
            Some(Location::Buffer) => {
                self.buffer.write().delete(id);
                self.metadata.write().remove(id);
                self.metrics.record_delete();
                true
            }
            Some(Location::Indexed(_)) => {
                self.graph.read().delete(id);
                self.metadata.write().remove(id);
                self.metrics.record_delete();
                true
            }
            None => false,
        }
    }

    /// Replaces `id`'s vector and metadata: delete-then-add (`spec.md` §6).
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `id` is not currently live; otherwise whatever
    /// [`Self::add`] returns for the replacement insert.
    pub fn update(&self, id: &str, vector: Vec<f32>, metadata: Option<Metadata>) -> Result<()> {
        if !self.delete(id) {
            return Err(Error::NotFound(id.to_string()));
        }
        self.add(id.to_string(), vector, metadata)
    }

    /// Returns the dequantized vector stored for `id`.
    #[must_use]
    pub fn get_vector(&self, id: &str) -> Option<Vec<f32>> {
        match self.ids.read().get(id)? {
            Location::Buffer => self.buffer.read().get_vector_by_id(id),
            Location::Indexed(_) => self.graph.read().get_vector(id),
        }
    }

    /// Returns a clone of the metadata stored for `id`.
    #[must_use]
    pub fn get_metadata(&self, id: &str) -> Option<Metadata> {
        self.metadata.read().get(id).cloned()
    }

    /// `true` if `id` is currently live (buffered or indexed).
    #[must_use]
    pub fn exists(&self, id: &str) -> bool {
        self.ids.read().contains(id)
    }

    /// Total live vector count.
    #[must_use]
    pub fn count(&self) -> usize {
        self.ids.read().len()
    }

    /// Searches the `k` nearest live vectors to `query` using the
    /// configured default beam width, with no metadata filter. Results are
    /// `(id, similarity, metadata)`, similarity in `[0, 1]`, descending
    /// (`spec.md` §6, §8 P8).
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an empty query or a dimension mismatch.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(String, f32, Metadata)>> {
        self.search_with_beam(query, k, None, None)
    }

    /// Searches the `k` nearest live vectors to `query`, optionally
    /// overriding the beam width and filtering by metadata. Results are
    /// `(id, similarity, metadata)`, similarity = `clamp(1 - cosine_distance,
    /// 0, 1)` in `[0, 1]`, descending (`spec.md` §6, §8 P8).
    ///
    /// When `filter` is set, the beam is widened 2x before filtering so
    /// `k` matches still surface after unmatching neighbors are dropped
    /// (`spec.md` §4.3.6).
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an empty query or a dimension mismatch.
    pub fn search_with_beam(
        &self,
        query: &[f32],
        k: usize,
        beam_width: Option<usize>,
        filter: Option<&Metadata>,
    ) -> Result<Vec<(String, f32, Metadata)>> {
        self.validate_dimension(query)?;
        let widened_k = if filter.is_some() { k * 2 } else { k };

        let mut merged = self.buffer.read().search_linear(query, widened_k);
        merged.extend(self.graph.read().search(query, widened_k, beam_width));
        merged.sort_by(|a, b| a.1.total_cmp(&b.1));

        let metadata = self.metadata.read();
        let results = merged
            .into_iter()
            .filter(|(id, _)| filter.is_none_or(|f| metadata.matches(id, f)))
            .take(k)
            .map(|(id, dist)| {
                let m = metadata.get(&id).cloned().unwrap_or_default();
                (id, crate::distance::similarity_from_distance(dist), m)
            })
            .collect();
        self.metrics.record_search();
        Ok(results)
    }

    /// Runs [`Self::search_with_beam`] for every query with a shared
    /// `filter`, in parallel when the `parallel` feature is enabled
    /// (`spec.md` §4.1, §6).
    ///
    /// # Errors
    ///
    /// The first per-query error encountered, if any.
    #[cfg(feature = "parallel")]
    pub fn batch_search(
        &self,
        queries: &[Vec<f32>],
        k: usize,
        filter: Option<&Metadata>,
    ) -> Result<Vec<Vec<(String, f32, Metadata)>>> {
        use rayon::prelude::*;
        queries.par_iter().map(|q| self.search_with_beam(q, k, None, filter)).collect()
    }

    /// Runs [`Self::search_with_beam`] for every query with a shared
    /// `filter`.
    ///
    /// # Errors
    ///
    /// The first per-query error encountered, if any.
    #[cfg(not(feature = "parallel"))]
    pub fn batch_search(
        &self,
        queries: &[Vec<f32>],
        k: usize,
        filter: Option<&Metadata>,
    ) -> Result<Vec<Vec<(String, f32, Metadata)>>> {
        queries.iter().map(|q| self.search_with_beam(q, k, None, filter)).collect()
    }

    fn set_quantization(&self, mode: QuantizationMode) -> Result<()> {
        if self.count() > 0 {
            return Err(Error::State(
                "quantization mode cannot change after the first insert".into(),
            ));
        }
        *self.codec.write() = codec_for(mode);
        Ok(())
    }

    /// Switches to 8-bit scalar quantization. Only valid before the first
    /// insert (`spec.md` §4.4).
    ///
    /// # Errors
    ///
    /// [`Error::State`] if the store already holds vectors.
    pub fn enable_scalar_quantization(&self) -> Result<()> {
        self.set_quantization(QuantizationMode::Scalar)
    }

    /// Switches to 1-bit binary quantization. Only valid before the first
    /// insert (`spec.md` §4.4).
    ///
    /// # Errors
    ///
    /// [`Error::State`] if the store already holds vectors.
    pub fn enable_binary_quantization(&self) -> Result<()> {
        self.set_quantization(QuantizationMode::Binary)
    }

    /// Configures where this store checkpoints to and recovers from.
    pub fn set_persistence(&self, binding: Box<dyn PersistenceBinding>) {
        *self.persistence.write() = Some(binding);
    }

    /// Flushes the buffer, then writes a full snapshot through the
    /// configured persistence binding (`spec.md` §4.5).
    ///
    /// # Errors
    ///
    /// [`Error::State`] if no binding is configured; otherwise whatever the
    /// binding's `checkpoint` returns.
    pub fn checkpoint(&self) -> Result<()> {
        self.flush()?;
        let persistence = self.persistence.read();
        let Some(binding) = persistence.as_ref() else {
            return Err(Error::State("no persistence binding configured".into()));
        };
        let snapshot = self.snapshot();
        binding.checkpoint(&snapshot)?;
        self.metrics.record_checkpoint();
        Ok(())
    }

    /// Replaces this store's in-memory state with the most recently
    /// committed snapshot, if any.
    ///
    /// # Errors
    ///
    /// [`Error::State`] if no binding is configured; otherwise whatever the
    /// binding's `recover` returns.
    pub fn recover(&self) -> Result<()> {
        let snapshot = {
            let persistence = self.persistence.read();
            let Some(binding) = persistence.as_ref() else {
                return Err(Error::State("no persistence binding configured".into()));
            };
            binding.recover()?
        };
        let Some(snapshot) = snapshot else {
            return Ok(());
        };
        let count = snapshot.node_to_id.len();
        self.restore(snapshot);
        self.metrics.record_recover(count);
        Ok(())
    }

    fn snapshot(&self) -> StoreSnapshot {
        let parts = self.graph.read().export();
        let metadata = self.metadata.read();
        let metadata_entries = parts
            .node_to_id
            .iter()
            .filter_map(|id| metadata.get(id).map(|m| (id.clone(), m.clone())))
            .collect();
        StoreSnapshot {
            dimension: (*self.dimension.read()).unwrap_or(0),
            quantization: self.codec.read().mode(),
            node_to_id: parts.node_to_id,
            vectors: parts.vectors,
            adjacency: parts.adjacency,
            medoid: parts.medoid,
            tombstoned: parts.tombstoned,
            metadata: metadata_entries,
        }
    }

    fn restore(&self, snapshot: StoreSnapshot) {
        let mut ids = IdMap::new();
        let tombstoned: std::collections::HashSet<u32> = snapshot.tombstoned.iter().copied().collect();
        for (node, id) in snapshot.node_to_id.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let node = node as u32;
            if !tombstoned.contains(&node) {
                ids.insert(id.clone(), Location::Indexed(node));
            }
        }

        let mut metadata = MetadataMap::new();
        for (id, m) in snapshot.metadata {
            metadata.set(id, m);
        }

        let params = self.graph.read().params();
        let graph = GraphIndex::restore(
            crate::graph::GraphParts {
                node_to_id: snapshot.node_to_id,
                vectors: snapshot.vectors,
                adjacency: snapshot.adjacency,
                medoid: snapshot.medoid,
                tombstoned: snapshot.tombstoned,
            },
            params,
        );

        *self.dimension.write() = if snapshot.dimension == 0 {
            None
        } else {
            Some(snapshot.dimension)
        };
        *self.codec.write() = codec_for(snapshot.quantization);
        self.buffer.write().clear();
        *self.graph.write() = graph;
        *self.ids.write() = ids;
        *self.metadata.write() = metadata;
    }

    /// Discards all in-memory state (buffer, graph, id/metadata maps),
    /// keeping the configured persistence binding in place.
    pub fn clear(&self) {
        *self.dimension.write() = None;
        self.buffer.write().clear();
        let params = self.graph.read().params();
        *self.graph.write() = GraphIndex::new(params);
        self.ids.write().clear();
        self.metadata.write().clear();
    }

    /// Point-in-time counters for this store.
    #[must_use]
    pub fn stats(&self) -> Stats {
        let quantization = self.codec.read().mode();
        let buffer_bytes = self.buffer.read().memory_size();
        let graph_bytes = self.graph.read().memory_size();
        #[allow(clippy::cast_precision_loss)]
        let to_mb = |bytes: usize| bytes as f64 / (1024.0 * 1024.0);

        Stats {
            count: self.count(),
            buffered: self.buffer.read().len(),
            indexed: self.graph.read().len(),
            dimension: *self.dimension.read(),
            quantization,
            algorithm: "vamana",
            storage_mode: StorageMode::from(quantization),
            buffer_bytes,
            graph_bytes,
            mb_buffer: to_mb(buffer_bytes),
            mb_graph: to_mb(graph_bytes),
            mb_total: to_mb(buffer_bytes + graph_bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> VectorStore {
        VectorStore::new(&Config {
            buffer_size: 4,
            ..Config::default()
        })
    }

    #[test]
    fn add_then_search_finds_self() {
        let store = store();
        store.add("a".into(), vec![1.0, 0.0], None).unwrap();
        store.add("b".into(), vec![0.0, 1.0], None).unwrap();
        let results = store.search(&[1.0, 0.0], 1).unwrap();
        assert_eq!(results[0].0, "a");
        assert!((results[0].1 - 1.0).abs() < 1e-5, "exact self-match must score ~1.0 similarity, got {}", results[0].1);
    }

    #[test]
    fn add_rejects_duplicate_id() {
        let store = store();
        store.add("a".into(), vec![1.0, 0.0], None).unwrap();
        let err = store.add("a".into(), vec![1.0, 0.0], None).unwrap_err();
        assert!(matches!(err, Error::DuplicateId(_)));
    }

    #[test]
    fn add_rejects_dimension_mismatch() {
        let store = store();
        store.add("a".into(), vec![1.0, 0.0], None).unwrap();
        let err = store.add("b".into(), vec![1.0, 0.0, 0.0], None).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn add_batch_flushes_into_graph_past_buffer_capacity() {
        let store = store();
        let items: Vec<_> = (0..10)
            .map(|i| (format!("id-{i}"), vec![i as f32, 1.0], None))
            .collect();
        let added = store.add_batch(items).unwrap();
        assert_eq!(added, 10);
        store.flush().unwrap();
        let stats = store.stats();
        assert_eq!(stats.indexed, 10);
        assert_eq!(stats.buffered, 0);
        assert_eq!(stats.algorithm, "vamana");
        assert_eq!(stats.storage_mode, StorageMode::Full);
        assert!(stats.graph_bytes > 0);
        assert_eq!(stats.buffer_bytes, 0);
        assert!(stats.mb_graph > 0.0);
        assert!((stats.mb_total - stats.mb_graph).abs() < 1e-12);
    }

    #[test]
    fn delete_removes_from_buffer_or_graph() {
        let store = store();
        store.add_batch(vec![("a".into(), vec![1.0, 0.0], None)]).unwrap();
        assert!(store.delete("a"));
        assert!(!store.exists("a"));
        assert!(!store.delete("a"));
    }

    #[test]
    fn search_before_flush_finds_buffered_items() {
        let store = store();
        store.add_batch(vec![("a".into(), vec![1.0, 0.0], None)]).unwrap();
        let results = store.search(&[1.0, 0.0], 1).unwrap();
        assert_eq!(results[0].0, "a");
    }

    #[test]
    fn search_with_filter_matches_metadata() {
        let store = store();
        let mut meta_a = Metadata::new();
        meta_a.insert("kind".into(), "doc".into());
        store.add("a".into(), vec![1.0, 0.0], Some(meta_a)).unwrap();
        store.add("b".into(), vec![0.9, 0.1], None).unwrap();

        let mut filter = Metadata::new();
        filter.insert("kind".into(), "doc".into());
        let results = store.search_with_beam(&[1.0, 0.0], 2, None, Some(&filter)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "a");
    }

    #[test]
    fn quantization_cannot_change_after_first_insert() {
        let store = store();
        store.add("a".into(), vec![1.0, 0.0], None).unwrap();
        let err = store.enable_scalar_quantization().unwrap_err();
        assert!(matches!(err, Error::State(_)));
    }

    #[test]
    fn capacity_is_enforced() {
        let store = VectorStore::new(&Config {
            max_vectors: 1,
            ..Config::default()
        });
        store.add("a".into(), vec![1.0], None).unwrap();
        let err = store.add("b".into(), vec![1.0], None).unwrap_err();
        assert!(matches!(err, Error::Capacity { .. }));
    }

    #[test]
    fn checkpoint_then_recover_round_trips_through_a_real_binding() {
        let dir = tempfile::tempdir().unwrap();
        let original = store();
        original.add("a".into(), vec![1.0, 0.0], None).unwrap();
        original.add_batch(vec![("b".into(), vec![0.0, 1.0], None)]).unwrap();
        original.set_persistence(Box::new(
            crate::storage::SnapshotStore::new(dir.path().join("snap.bin")).unwrap(),
        ));
        original.checkpoint().unwrap();

        let restored = store();
        restored.set_persistence(Box::new(
            crate::storage::SnapshotStore::new(dir.path().join("snap.bin")).unwrap(),
        ));
        restored.recover().unwrap();
        assert_eq!(restored.count(), 2);
        assert!(restored.exists("a"));
        assert!(restored.exists("b"));
    }

    #[test]
    fn clear_empties_the_store() {
        let store = store();
        store.add("a".into(), vec![1.0, 0.0], None).unwrap();
        store.clear();
        assert_eq!(store.count(), 0);
        assert!(store.add("a".into(), vec![1.0, 0.0, 0.0], None).is_ok());
    }
}
