//! Vamana/`DiskANN`-style approximate nearest-neighbor graph (`spec.md`
//! §4.3).
//!
//! Grounded in the teacher's HNSW graph module (`index/hnsw/graph.rs`):
//! same single-writer/multi-reader split (a lock guarding mutable
//! construction state, an immutable snapshot published for readers), same
//! "resolve string id to a dense node id" indirection. The graph algorithm
//! itself follows the Vamana construction/search rules in `spec.md` §4.3.3
//! - §4.3.5 rather than HNSW's layered skip-list structure.

mod csr;
mod ordered_float;
mod params;
mod prune;
mod search;

pub use params::{adaptive_beam_width, VamanaParams};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arc_swap::ArcSwapOption;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::quantization::EncodedVector;

use csr::CsrArrays;

/// Node ids at or above which a medoid refresh is attempted again.
const MEDOID_REFRESH_INTERVAL: u64 = 1000;
/// Upper bound on how many nodes a medoid refresh samples.
const MEDOID_SAMPLE_SIZE: usize = 256;

struct Inner {
    vectors: Vec<EncodedVector>,
    id_to_node: FxHashMap<String, u32>,
    node_to_id: Vec<String>,
    adjacency: Vec<Vec<u32>>,
    tombstoned: FxHashSet<u32>,
    medoid: Option<u32>,
}

impl Inner {
    fn distance_between(&self, a: u32, b: u32) -> f32 {
        let va = self.vectors[a as usize].to_f32();
        crate::distance::cosine_distance(&va, &self.vectors[b as usize].to_f32())
    }

    fn live_node_count(&self) -> usize {
        self.node_to_id.len() - self.tombstoned.len()
    }
}

/// The ANN graph: a dense arena of node ids with per-node adjacency lists,
/// searched by beam search from a medoid entry point.
///
/// Writes mutate the canonical adjacency under a single [`RwLock`] (`spec.md`
/// §5 single-writer rule). Reads use an immutable [`CsrArrays`] compacted
/// lazily on the first `search` after any write and published through
/// [`ArcSwapOption`] so concurrent readers never block on, or observe a
/// torn view of, an in-progress rebuild (`spec.md` §9's epoch-based
/// reclamation allowance).
pub struct GraphIndex {
    inner: RwLock<Inner>,
    finalized: ArcSwapOption<CsrArrays>,
    dirty: AtomicBool,
    insert_count: AtomicU64,
    params: VamanaParams,
}

/// The pieces of a [`GraphIndex`] needed to persist and later reconstruct it
/// (`spec.md` §4.5).
pub struct GraphParts {
    /// Dense node id -> external id, in node-id order.
    pub node_to_id: Vec<String>,
    /// Dense node id -> stored vector, parallel to `node_to_id`.
    pub vectors: Vec<EncodedVector>,
    /// Dense node id -> neighbor node ids, parallel to `node_to_id`.
    pub adjacency: Vec<Vec<u32>>,
    /// Current medoid entry point, if any node has been inserted.
    pub medoid: Option<u32>,
    /// Node ids tombstoned by delete.
    pub tombstoned: Vec<u32>,
}

impl GraphIndex {
    /// Creates an empty graph with the given construction/search parameters.
    #[must_use]
    pub fn new(params: VamanaParams) -> Self {
        Self {
            inner: RwLock::new(Inner {
                vectors: Vec::new(),
                id_to_node: FxHashMap::default(),
                node_to_id: Vec::new(),
                adjacency: Vec::new(),
                tombstoned: FxHashSet::default(),
                medoid: None,
            }),
            finalized: ArcSwapOption::const_empty(),
            dirty: AtomicBool::new(false),
            insert_count: AtomicU64::new(0),
            params,
        }
    }

    /// Number of live (non-deleted) vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().live_node_count()
    }

    /// `true` if the graph holds no live vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes occupied by vector payloads plus adjacency lists
    /// (`spec.md` §6 `stats().mb_*`). An estimate: adjacency entries are
    /// costed as `u32`s, ignoring `Vec` allocator overhead.
    #[must_use]
    pub fn memory_size(&self) -> usize {
        let inner = self.inner.read();
        let vectors: usize = inner.vectors.iter().map(crate::quantization::EncodedVector::memory_size).sum();
        let adjacency: usize = inner.adjacency.iter().map(|n| n.len() * std::mem::size_of::<u32>()).sum();
        vectors + adjacency
    }

    /// The construction/search parameters this graph was built with.
    #[must_use]
    pub fn params(&self) -> VamanaParams {
        self.params
    }

    /// `true` if `id` currently resolves to a live node.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        let inner = self.inner.read();
        inner
            .id_to_node
            .get(id)
            .is_some_and(|&n| !inner.tombstoned.contains(&n))
    }

    /// Returns the dequantized vector stored for `id`.
    #[must_use]
    pub fn get_vector(&self, id: &str) -> Option<Vec<f32>> {
        let inner = self.inner.read();
        let node = *inner.id_to_node.get(id)?;
        if inner.tombstoned.contains(&node) {
            return None;
        }
        Some(inner.vectors[node as usize].to_f32())
    }

    /// Inserts a single vector, wiring it into the graph per `spec.md`
    /// §4.3.3: find candidate neighbors via beam search from the medoid,
    /// prune them for diversity, write forward edges, then backfill and
    /// re-prune any neighbor whose reverse edge pushes it over `r_max`.
    /// Returns the dense node id assigned to `id`.
    pub fn add(&self, id: String, vector: EncodedVector) -> u32 {
        let mut inner = self.inner.write();

        #[allow(clippy::cast_possible_truncation)]
        let node = inner.vectors.len() as u32;
        inner.vectors.push(vector);
        inner.node_to_id.push(id.clone());
        inner.id_to_node.insert(id, node);
        inner.adjacency.push(Vec::new());

        if inner.medoid.is_none() {
            inner.medoid = Some(node);
            self.dirty.store(true, Ordering::Release);
            self.bump_insert_count(&mut inner);
            return node;
        }

        let entry = inner.medoid.expect("just checked is_none above");
        let visited = search::beam_search(
            entry,
            self.params.l_build,
            |n| inner.adjacency[n as usize].clone(),
            |n| inner.distance_between(node, n),
        );
        let candidates: Vec<(u32, f32)> = visited.into_iter().filter(|&(n, _)| n != node).collect();

        let selected = prune::robust_prune(&candidates, self.params.r_max, self.params.alpha, |a, b| {
            inner.distance_between(a, b)
        });

        inner.adjacency[node as usize].clone_from(&selected);

        for &neighbor in &selected {
            let degree = inner.adjacency[neighbor as usize].len();
            if degree < self.params.r_max {
                inner.adjacency[neighbor as usize].push(node);
            } else {
                let mut reverse_candidates: Vec<(u32, f32)> = inner.adjacency[neighbor as usize]
                    .iter()
                    .map(|&v| (v, inner.distance_between(neighbor, v)))
                    .collect();
                reverse_candidates.push((node, inner.distance_between(neighbor, node)));
                let repruned = prune::robust_prune(
                    &reverse_candidates,
                    self.params.r_max,
                    self.params.alpha,
                    |a, b| inner.distance_between(a, b),
                );
                inner.adjacency[neighbor as usize] = repruned;
            }
        }

        self.dirty.store(true, Ordering::Release);
        self.bump_insert_count(&mut inner);
        node
    }

    fn bump_insert_count(&self, inner: &mut Inner) {
        let count = self.insert_count.fetch_add(1, Ordering::AcqRel) + 1;
        if count % MEDOID_REFRESH_INTERVAL == 0 {
            refresh_medoid(inner);
        }
    }

    /// Inserts a batch of vectors, equivalent to calling [`Self::add`] for
    /// each item in order (`spec.md` §4.3.7).
    pub fn add_batch(&self, items: Vec<(String, EncodedVector)>) {
        for (id, vector) in items {
            self.add(id, vector);
        }
    }

    /// Tombstones `id`: it stops resolving for lookups and search results,
    /// but its node slot and edges are kept so other nodes stay reachable
    /// through it (`spec.md`'s no-compaction, no-WAL design). Reinserting
    /// the same string id later allocates a fresh node.
    pub fn delete(&self, id: &str) -> bool {
        let mut inner = self.inner.write();
        let Some(&node) = inner.id_to_node.get(id) else {
            return false;
        };
        if !inner.tombstoned.insert(node) {
            return false;
        }
        inner.id_to_node.remove(id);
        if inner.medoid == Some(node) {
            refresh_medoid(&mut inner);
        }
        self.dirty.store(true, Ordering::Release);
        true
    }

    /// Rebuilds and publishes the compacted CSR snapshot if the adjacency
    /// has changed since the last publish. Idempotent and cheap to call
    /// repeatedly when not dirty.
    pub fn finalize(&self) {
        if self
            .dirty
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let inner = self.inner.read();
        let csr = CsrArrays::build(&inner.adjacency);
        self.finalized.store(Some(std::sync::Arc::new(csr)));
    }

    /// Searches for the `k` nearest live vectors to `query`, using the
    /// given beam width, or [`adaptive_beam_width`] scaled to `k` and the
    /// current live node count when `None` (`spec.md` §4.3.1, §4.3.6).
    #[must_use]
    pub fn search(&self, query: &[f32], k: usize, beam_width: Option<usize>) -> Vec<(String, f32)> {
        self.finalize();
        let inner = self.inner.read();
        let Some(medoid) = inner.medoid else {
            return Vec::new();
        };
        let Some(csr) = self.finalized.load_full() else {
            return Vec::new();
        };
        debug_assert_eq!(csr.len(), inner.node_to_id.len());
        let l = beam_width.unwrap_or_else(|| params::adaptive_beam_width(k, inner.live_node_count())).max(k);

        let results = search::beam_search(
            medoid,
            l,
            |n| csr.neighbors(n).to_vec(),
            |n| inner.vectors[n as usize].distance_to(query),
        );

        results
            .into_iter()
            .filter(|&(n, _)| !inner.tombstoned.contains(&n))
            .take(k)
            .map(|(n, dist)| (inner.node_to_id[n as usize].clone(), dist))
            .collect()
    }

    /// Exports the pieces needed to persist this graph (`spec.md` §4.5).
    #[must_use]
    pub fn export(&self) -> GraphParts {
        let inner = self.inner.read();
        GraphParts {
            node_to_id: inner.node_to_id.clone(),
            vectors: inner.vectors.clone(),
            adjacency: inner.adjacency.clone(),
            medoid: inner.medoid,
            tombstoned: inner.tombstoned.iter().copied().collect(),
        }
    }

    /// Rebuilds a graph from previously [`Self::export`]ed parts, marking
    /// the CSR snapshot dirty so the next `search` rebuilds it.
    #[must_use]
    pub fn restore(parts: GraphParts, params: VamanaParams) -> Self {
        let id_to_node = parts
            .node_to_id
            .iter()
            .enumerate()
            .map(|(node, id)| {
                #[allow(clippy::cast_possible_truncation)]
                (id.clone(), node as u32)
            })
            .collect();
        Self {
            inner: RwLock::new(Inner {
                vectors: parts.vectors,
                id_to_node,
                node_to_id: parts.node_to_id,
                adjacency: parts.adjacency,
                tombstoned: parts.tombstoned.into_iter().collect(),
                medoid: parts.medoid,
            }),
            finalized: ArcSwapOption::const_empty(),
            dirty: AtomicBool::new(true),
            insert_count: AtomicU64::new(0),
            params,
        }
    }
}

/// Approximates graph centrality by sampling up to [`MEDOID_SAMPLE_SIZE`]
/// live nodes and picking the one with the highest out-degree, a cheap
/// proxy for "well connected" that avoids an O(n) centroid pass on every
/// refresh.
fn refresh_medoid(inner: &mut Inner) {
    let total = inner.node_to_id.len();
    if total == 0 {
        inner.medoid = None;
        return;
    }
    let stride = (total / MEDOID_SAMPLE_SIZE.max(1)).max(1);
    let mut best: Option<(u32, usize)> = None;
    let mut idx = 0usize;
    while idx < total {
        #[allow(clippy::cast_possible_truncation)]
        let node = idx as u32;
        if !inner.tombstoned.contains(&node) {
            let degree = inner.adjacency[idx].len();
            if best.is_none_or(|(_, best_degree)| degree > best_degree) {
                best = Some((node, degree));
            }
        }
        idx += stride;
    }
    inner.medoid = best.map(|(node, _)| node).or(inner.medoid);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(v: Vec<f32>) -> EncodedVector {
        EncodedVector::Full(v)
    }

    fn build_cluster(n: usize) -> GraphIndex {
        let graph = GraphIndex::new(VamanaParams::custom(8, 20, 20, 1.2));
        for i in 0..n {
            #[allow(clippy::cast_precision_loss)]
            let v = vec![i as f32, (n - i) as f32];
            graph.add(format!("id-{i}"), full(v));
        }
        graph
    }

    #[test]
    fn single_insert_becomes_medoid_and_is_searchable() {
        let graph = GraphIndex::new(VamanaParams::default());
        graph.add("a".into(), full(vec![1.0, 0.0]));
        assert_eq!(graph.len(), 1);
        let results = graph.search(&[1.0, 0.0], 1, None);
        assert_eq!(results[0].0, "a");
    }

    #[test]
    fn search_returns_nearest_neighbor_first() {
        let graph = build_cluster(30);
        let results = graph.search(&[29.0, 1.0], 3, None);
        assert!(!results.is_empty());
        assert_eq!(results[0].0, "id-29");
        assert!(results.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn deleted_ids_are_excluded_from_search_and_lookup() {
        let graph = build_cluster(20);
        assert!(graph.delete("id-19"));
        assert!(!graph.contains("id-19"));
        assert!(graph.get_vector("id-19").is_none());
        let results = graph.search(&[19.0, 1.0], 5, None);
        assert!(results.iter().all(|(id, _)| id != "id-19"));
    }

    #[test]
    fn deleting_unknown_id_returns_false() {
        let graph = build_cluster(5);
        assert!(!graph.delete("missing"));
    }

    #[test]
    fn neighbor_lists_respect_the_out_degree_bound() {
        let graph = build_cluster(60);
        let inner = graph.inner.read();
        assert!(inner.adjacency.iter().all(|n| n.len() <= 8));
    }

    #[test]
    fn finalize_is_idempotent_when_not_dirty() {
        let graph = build_cluster(10);
        graph.finalize();
        assert!(!graph.dirty.load(Ordering::Acquire));
        graph.finalize();
        assert!(!graph.dirty.load(Ordering::Acquire));
    }
}
