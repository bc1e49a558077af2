//! Vamana graph construction/search parameters (`spec.md` §4.3.1).
//!
//! Grounded in the teacher's `index/hnsw/params.rs` `HnswParams` (same
//! `auto`/preset constructor shapes), renamed to the Vamana vocabulary.

use serde::{Deserialize, Serialize};

/// Construction and search parameters for a [`super::GraphIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VamanaParams {
    /// Maximum out-degree per node.
    pub r_max: usize,
    /// Build-time beam width.
    pub l_build: usize,
    /// Default search-time beam width (overridable per-call).
    pub l_search: usize,
    /// Prune diversity factor (alpha-RNG rule).
    pub alpha: f32,
}

impl Default for VamanaParams {
    fn default() -> Self {
        Self {
            r_max: 64,
            l_build: 100,
            l_search: 70,
            alpha: 1.2,
        }
    }
}

impl VamanaParams {
    /// Default parameters, independent of dimension (`spec.md` §4.3.1 table).
    #[must_use]
    pub fn auto(_dimension: usize) -> Self {
        Self::default()
    }

    /// Smaller `r_max`/beams for faster indexing at the cost of recall.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            r_max: 32,
            l_build: 50,
            l_search: 40,
            alpha: 1.2,
        }
    }

    /// Larger `r_max`/beams for higher recall at the cost of latency.
    #[must_use]
    pub fn high_recall() -> Self {
        Self {
            r_max: 96,
            l_build: 200,
            l_search: 150,
            alpha: 1.2,
        }
    }

    /// Custom parameters.
    #[must_use]
    pub const fn custom(r_max: usize, l_build: usize, l_search: usize, alpha: f32) -> Self {
        Self {
            r_max,
            l_build,
            l_search,
            alpha,
        }
    }
}

/// Adaptive search-time beam width: `max(2k, 50) + delta(n)` (`spec.md`
/// §4.3.1), where `delta` grows with the number of indexed nodes.
#[must_use]
pub fn adaptive_beam_width(k: usize, n: usize) -> usize {
    let base = (2 * k).max(50);
    let delta = match n {
        0..=999 => 0,
        1_000..=9_999 => 20,
        10_000..=99_999 => 50,
        _ => 100,
    };
    base + delta
}
