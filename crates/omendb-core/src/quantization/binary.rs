//! Binary quantization (1 bit per dimension) for a coarse first-stage filter.
//!
//! `q_i = sign(v_i - mean(v))`, packed 8 per byte. Adapted from the
//! teacher's `quantization::binary` module. Re-scoring with full precision
//! is a future extension and not required by `spec.md` §4.4.

use serde::{Deserialize, Serialize};

/// A vector quantized to 1 bit per dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryQuantizedVector {
    /// Packed bits, 8 per byte.
    pub data: Vec<u8>,
    dimension: usize,
}

impl BinaryQuantizedVector {
    /// Quantizes `vector` around its own mean: values `>= mean` become `1`.
    ///
    /// # Panics
    ///
    /// Panics if `vector` is empty.
    #[must_use]
    pub fn from_f32(vector: &[f32]) -> Self {
        assert!(!vector.is_empty(), "cannot quantize an empty vector");

        let dimension = vector.len();
        #[allow(clippy::cast_precision_loss)]
        let mean = vector.iter().sum::<f32>() / dimension as f32;
        let num_bytes = dimension.div_ceil(8);
        let mut data = vec![0u8; num_bytes];

        for (i, &value) in vector.iter().enumerate() {
            if value >= mean {
                data[i / 8] |= 1 << (i % 8);
            }
        }

        Self { data, dimension }
    }

    /// Dimension of the original vector.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Storage footprint in bytes: `ceil(D / 8)`.
    #[must_use]
    pub fn memory_size(&self) -> usize {
        self.data.len()
    }

    /// Hamming distance (number of differing bits) to another binary vector.
    ///
    /// # Panics
    ///
    /// Panics if dimensions differ.
    #[must_use]
    pub fn hamming_distance(&self, other: &Self) -> u32 {
        assert_eq!(self.dimension, other.dimension, "dimension mismatch");
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| (a ^ b).count_ones())
            .sum()
    }

    /// Normalized Hamming similarity in `[0, 1]`, `1.0` for identical vectors.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hamming_similarity(&self, other: &Self) -> f32 {
        1.0 - (self.hamming_distance(other) as f32 / self.dimension as f32)
    }

    /// Reconstructs the sign pattern as a `+1.0`/`-1.0` vector. This is not
    /// the original magnitude (`spec.md` §4.4: binary quantization keeps no
    /// recoverable magnitude), but it is a real, non-panicking answer for
    /// [`crate::store::VectorStore::get_vector`] on a binary-quantized id.
    #[must_use]
    pub fn to_f32(&self) -> Vec<f32> {
        (0..self.dimension)
            .map(|i| if self.data[i / 8] & (1 << (i % 8)) != 0 { 1.0 } else { -1.0 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_zero_hamming_distance() {
        let v = vec![1.0, -1.0, 2.0, -2.0, 0.5];
        let a = BinaryQuantizedVector::from_f32(&v);
        let b = BinaryQuantizedVector::from_f32(&v);
        assert_eq!(a.hamming_distance(&b), 0);
        assert_eq!(a.hamming_similarity(&b), 1.0);
    }

    #[test]
    fn memory_size_is_packed() {
        let v = vec![0.3; 17];
        let q = BinaryQuantizedVector::from_f32(&v);
        assert_eq!(q.memory_size(), 3); // ceil(17/8)
    }

    #[test]
    fn to_f32_reconstructs_the_sign_pattern_without_panicking() {
        let v = vec![5.0, -5.0, 3.0, -3.0];
        let q = BinaryQuantizedVector::from_f32(&v);
        let back = q.to_f32();
        assert_eq!(back.len(), v.len());
        for (orig, bit) in v.iter().zip(back.iter()) {
            assert_eq!(orig.signum(), bit.signum());
        }
    }
}
