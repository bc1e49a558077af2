//! Abstract metrics sink.
//!
//! The core never formats metrics for a specific wire format (Prometheus,
//! StatsD, JSON) — that belongs to an out-of-scope observability layer. It
//! only emits counters to an abstract [`Metrics`] trait. [`NoopMetrics`] is
//! the zero-cost default; [`AtomicMetrics`] is a reference implementation a
//! host can read back for tests or its own export pipeline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Sink for operational counters emitted by a [`crate::store::VectorStore`].
pub trait Metrics: Send + Sync {
    /// A vector was successfully inserted (buffer or graph path).
    fn record_insert(&self) {}
    /// An id was deleted (or tombstoned).
    fn record_delete(&self) {}
    /// A `search`/`search_with_beam`/`batch_search` call completed.
    fn record_search(&self) {}
    /// The buffer was flushed into the graph.
    fn record_flush(&self, items: usize) {
        let _ = items;
    }
    /// A checkpoint completed successfully.
    fn record_checkpoint(&self) {}
    /// A recovery completed, restoring `count` vectors.
    fn record_recover(&self, count: usize) {
        let _ = count;
    }
}

/// Discards every event. Used when the host does not care about counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {}

/// Thread-safe atomic counters, exposed as plain fields for a host to read.
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    /// Total successful inserts.
    pub inserts: AtomicU64,
    /// Total deletes (including tombstones).
    pub deletes: AtomicU64,
    /// Total search calls (single or batched, counted once per call).
    pub searches: AtomicU64,
    /// Total buffer flushes.
    pub flushes: AtomicU64,
    /// Total vectors moved from buffer to graph across all flushes.
    pub flushed_items: AtomicU64,
    /// Total successful checkpoints.
    pub checkpoints: AtomicU64,
    /// Total vectors restored across all recoveries.
    pub recovered_items: AtomicU64,
}

impl AtomicMetrics {
    /// Creates a shared, zeroed metrics instance.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl Metrics for AtomicMetrics {
    fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    fn record_search(&self) {
        self.searches.fetch_add(1, Ordering::Relaxed);
    }

    fn record_flush(&self, items: usize) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.flushed_items.fetch_add(items as u64, Ordering::Relaxed);
    }

    fn record_checkpoint(&self) {
        self.checkpoints.fetch_add(1, Ordering::Relaxed);
    }

    fn record_recover(&self, count: usize) {
        self.recovered_items
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}
