//! CSR (compressed sparse row) compaction of the building-mode adjacency
//! lists (`spec.md` §4.3.2, §9).
//!
//! The graph always keeps its canonical, mutable adjacency as per-node
//! growable lists (`Vec<Vec<u32>>`) while being written to. [`CsrArrays`] is
//! an immutable snapshot compacted from those lists and published through
//! an `arc-swap` pointer so that a `search` reads a consistent, lock-light
//! view even while a later write is rebuilding the lists underneath it —
//! the tagged `Building`/`Finalized` duality `spec.md` §9 calls for,
//! expressed as "always-building plus a lazily-refreshed immutable cache"
//! rather than two structures maintained in parallel.

/// Immutable compacted adjacency: `offsets[n+1]` and `edges[]`.
#[derive(Debug, Clone)]
pub struct CsrArrays {
    pub(crate) offsets: Vec<u32>,
    pub(crate) edges: Vec<u32>,
}

impl CsrArrays {
    /// Compacts per-node adjacency lists into a single CSR layout.
    #[must_use]
    pub(crate) fn build(adjacency: &[Vec<u32>]) -> Self {
        let mut offsets = Vec::with_capacity(adjacency.len() + 1);
        let mut edges = Vec::new();
        offsets.push(0u32);
        for neighbors in adjacency {
            edges.extend_from_slice(neighbors);
            #[allow(clippy::cast_possible_truncation)]
            offsets.push(edges.len() as u32);
        }
        Self { offsets, edges }
    }

    /// Neighbor slice for `node`.
    #[must_use]
    pub(crate) fn neighbors(&self, node: u32) -> &[u32] {
        let node = node as usize;
        if node + 1 >= self.offsets.len() {
            return &[];
        }
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        &self.edges[start..end]
    }

    /// Number of nodes represented.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }
}
