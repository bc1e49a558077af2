//! Scalar quantization (SQ8) for memory-efficient vector storage.
//!
//! Per-vector affine encoding `q_i = round((v_i - offset) / scale)` into
//! `u8`, with `scale = (max - min) / 255` and `offset = min`. Adapted from
//! the teacher's `quantization::scalar` module; field names follow
//! `spec.md` §4.4 (`scale`/`offset`) rather than the teacher's `min`/`max`.

use serde::{Deserialize, Serialize};

/// A vector quantized to 8 bits per dimension plus an 8-byte header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarQuantizedVector {
    /// Quantized data: one byte per dimension.
    pub data: Vec<u8>,
    /// Affine scale: `(max - min) / 255`.
    pub scale: f32,
    /// Affine offset: `min`.
    pub offset: f32,
}

impl ScalarQuantizedVector {
    /// Quantizes `vector` into 8-bit codes with a per-vector affine header.
    ///
    /// # Panics
    ///
    /// Panics if `vector` is empty.
    #[must_use]
    pub fn from_f32(vector: &[f32]) -> Self {
        assert!(!vector.is_empty(), "cannot quantize an empty vector");

        let min = vector.iter().copied().fold(f32::INFINITY, f32::min);
        let max = vector.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let range = max - min;

        let (scale, data) = if range < f32::EPSILON {
            (0.0, vec![0u8; vector.len()])
        } else {
            let scale = range / 255.0;
            let inv_scale = 255.0 / range;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let data = vector
                .iter()
                .map(|&v| ((v - min) * inv_scale).round().clamp(0.0, 255.0) as u8)
                .collect();
            (scale, data)
        };

        Self {
            data,
            scale,
            offset: min,
        }
    }

    /// Dequantizes back to an approximate `f32` vector:
    /// `v_i = q_i * scale + offset`.
    #[must_use]
    pub fn to_f32(&self) -> Vec<f32> {
        self.data
            .iter()
            .map(|&q| f32::from(q) * self.scale + self.offset)
            .collect()
    }

    /// Dimension of the original vector.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Storage footprint in bytes: `D` data bytes + 8-byte header.
    #[must_use]
    pub fn memory_size(&self) -> usize {
        self.data.len() + 8
    }
}

/// Cosine similarity between a full-precision query and a quantized vector,
/// dequantizing on the fly (`spec.md` §4.4 default strategy).
#[must_use]
pub fn cosine_similarity_quantized(query: &[f32], quantized: &ScalarQuantizedVector) -> f32 {
    let reconstructed = quantized.to_f32();
    1.0 - crate::distance::cosine_distance(query, &reconstructed)
}
