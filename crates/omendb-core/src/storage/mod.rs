//! Persistence bindings (`spec.md` §4.5).
//!
//! `spec.md` explicitly excludes a write-ahead log: a
//! [`PersistenceBinding`] persists a full [`StoreSnapshot`] at checkpoint
//! time rather than replaying incremental operations. [`MemoryMappedStore`]
//! is the primary binding (reads the committed snapshot via `memmap2`,
//! `spec.md` §4.5.1); [`SnapshotStore`] is a plain-file fallback kept for
//! environments without mmap support (`spec.md` §4.5.2). Both commit
//! through the same hot/cold double-buffer swap so a crash mid-checkpoint
//! leaves the previously committed snapshot intact (`spec.md` §9's
//! two-phase `begin_checkpoint`/`commit` redesign note).

#[cfg(feature = "persistence")]
mod mmap;
mod snapshot;

#[cfg(feature = "persistence")]
pub use mmap::MemoryMappedStore;
pub use snapshot::SnapshotStore;

use serde::{Deserialize, Serialize};

use crate::metadata::Metadata;
use crate::quantization::{EncodedVector, QuantizationMode};

/// Full on-disk representation of a [`crate::store::VectorStore`], written
/// whole at every checkpoint (`spec.md` §4.5).
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Vector dimension, or 0 if no vector had been inserted yet.
    pub dimension: usize,
    /// Quantization mode active when the snapshot was taken.
    pub quantization: QuantizationMode,
    /// Dense node id -> external id, in node-id order.
    pub node_to_id: Vec<String>,
    /// Dense node id -> stored (possibly quantized) vector, parallel to
    /// `node_to_id`.
    pub vectors: Vec<EncodedVector>,
    /// Dense node id -> neighbor node ids, parallel to `node_to_id`.
    pub adjacency: Vec<Vec<u32>>,
    /// Medoid entry point at snapshot time, if any.
    pub medoid: Option<u32>,
    /// Node ids tombstoned by delete, excluded from search and lookup.
    pub tombstoned: Vec<u32>,
    /// Metadata for every live id at snapshot time.
    pub metadata: Vec<(String, Metadata)>,
}

/// A place a [`VectorStore`](crate::store::VectorStore) can persist to and
/// recover from. Implementations own the on-disk format; the coordinator
/// only deals in whole [`StoreSnapshot`]s.
pub trait PersistenceBinding: Send + Sync {
    /// Persists `snapshot`, replacing whatever was previously committed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Persistence`] on I/O failure.
    fn checkpoint(&self, snapshot: &StoreSnapshot) -> crate::error::Result<()>;

    /// Loads the most recently committed snapshot, or `None` if nothing has
    /// ever been checkpointed at this location.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Persistence`] on I/O failure or a
    /// corrupted/unrecognized on-disk format.
    fn recover(&self) -> crate::error::Result<Option<StoreSnapshot>>;
}
