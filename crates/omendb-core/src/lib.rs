//! # `OmenDB` Core
//!
//! Embedded vector database core: a write buffer backed by a
//! Vamana/`DiskANN`-style approximate nearest-neighbor graph, with optional
//! scalar/binary quantization and memory-mapped persistence.
//!
//! `OmenDB` is a local-first vector index library, not a server: no FFI
//! bindings, CLI, or network protocol live in this crate, and the distance
//! metric is fixed to cosine similarity.
//!
//! ## Quick start
//!
//! ```rust
//! use omendb_core::{CollectionRegistry, Config, NoopMetrics};
//! use std::sync::Arc;
//!
//! let registry = CollectionRegistry::new(Config::default(), Arc::new(NoopMetrics));
//! let collection = registry.get("default").unwrap();
//!
//! collection.add("doc-1".to_string(), vec![0.1, 0.2, 0.3], None).unwrap();
//! let results = collection.search(&[0.1, 0.2, 0.3], 5).unwrap();
//! assert_eq!(results[0].0, "doc-1");
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod buffer;
pub mod config;
pub mod distance;
pub mod error;
pub mod graph;
pub mod id_map;
pub mod metadata;
pub mod metrics;
pub mod quantization;
pub mod registry;
pub mod storage;
pub mod store;

pub use buffer::VectorBuffer;
pub use config::Config;
pub use distance::{cosine_distance, similarity_from_distance};
pub use error::{Error, Result};
pub use graph::{adaptive_beam_width, GraphIndex, GraphParts, VamanaParams};
pub use id_map::{IdMap, Location};
pub use metadata::{Metadata, MetadataMap};
pub use metrics::{AtomicMetrics, Metrics, NoopMetrics};
pub use quantization::{
    codec_for, BinaryQuantizedVector, EncodedVector, QuantCodec, QuantizationMode, ScalarQuantizedVector,
};
pub use registry::{CollectionRegistry, DEFAULT_COLLECTION};
pub use storage::{PersistenceBinding, StoreSnapshot};
#[cfg(feature = "persistence")]
pub use storage::MemoryMappedStore;
pub use storage::SnapshotStore;
pub use store::{StorageMode, Stats, VectorStore};
