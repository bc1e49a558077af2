//! Error taxonomy surfaced by the OmenDB core.
//!
//! Validation and duplicate-id errors are recoverable and returned as typed
//! results (or collapsed to per-item booleans at the batch API boundary).
//! Persistence and internal errors are logged via `tracing` at the point
//! they are constructed, then returned from the offending call; they never
//! leave the in-memory index in a partially-mutated state.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the vector store coordinator and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// Empty vector, dimension mismatch, invalid k, or a missing required id.
    #[error("validation error: {0}")]
    Validation(String),

    /// Insert of an id already present in the buffer or the graph.
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// Get/delete/update of an id that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation invalid given the store's current lifecycle state, e.g.
    /// enabling quantization after inserts, or reconfiguring persistence
    /// with a conflicting dimension.
    #[error("invalid state: {0}")]
    State(String),

    /// The implementation-defined maximum live vector count was reached.
    #[error("capacity exceeded: limit is {limit}")]
    Capacity {
        /// The configured maximum live vector count.
        limit: usize,
    },

    /// File I/O, header mismatch, or corrupt segment during checkpoint/recover.
    #[error("persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    /// Allocation failure or invariant violation. The call unwinds without
    /// corrupting prior state.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Builds a [`Error::Persistence`] variant, logging at `error` level.
    pub(crate) fn persistence(err: std::io::Error) -> Self {
        tracing::error!(error = %err, "persistence operation failed");
        Self::Persistence(err)
    }

    /// Builds a [`Error::Internal`] variant, logging at `error` level.
    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!(%msg, "internal invariant violation");
        Self::Internal(msg)
    }
}
