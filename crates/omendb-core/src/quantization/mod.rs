//! Quantization codecs integrated with the graph and buffer so vectors are
//! never materialized twice (`spec.md` §4.4).
//!
//! `spec.md` §9 calls for replacing runtime `if use_binary … else if
//! use_scalar …` dispatch with a codec trait; [`QuantCodec`] is that trait,
//! with [`None`], [`Scalar`], and [`Binary`] implementations. A
//! [`crate::store::VectorStore`] picks one codec for its lifetime via its
//! [`QuantizationMode`].

mod binary;
mod scalar;

pub use binary::BinaryQuantizedVector;
pub use scalar::{cosine_similarity_quantized, ScalarQuantizedVector};

use serde::{Deserialize, Serialize};

/// Quantization mode selected for a store. Set before the first insert;
/// `spec.md` §4.4 forbids changing it afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantizationMode {
    /// Full-precision `f32` storage (default).
    #[default]
    None,
    /// 8-bit scalar quantization (~4x memory reduction).
    Scalar,
    /// 1-bit binary quantization (~32x memory reduction, coarse filter only).
    Binary,
}

/// The encoded form a [`QuantCodec`] stores per vector, internal to the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EncodedVector {
    /// No quantization: the original vector is kept verbatim.
    Full(Vec<f32>),
    /// Scalar-quantized payload.
    Scalar(ScalarQuantizedVector),
    /// Binary-quantized payload.
    Binary(BinaryQuantizedVector),
}

impl EncodedVector {
    /// Dequantizes (or clones, for [`Self::Full`]) back to an `f32` vector.
    #[must_use]
    pub fn to_f32(&self) -> Vec<f32> {
        match self {
            Self::Full(v) => v.clone(),
            Self::Scalar(q) => q.to_f32(),
            Self::Binary(q) => q.to_f32(),
        }
    }

    /// Approximate distance to a full-precision query vector, dequantizing
    /// on the fly per `spec.md` §4.4's default strategy.
    #[must_use]
    pub fn distance_to(&self, query: &[f32]) -> f32 {
        match self {
            Self::Full(v) => crate::distance::cosine_distance(query, v),
            Self::Scalar(q) => 1.0 - cosine_similarity_quantized(query, q),
            Self::Binary(q) => {
                let query_bits = BinaryQuantizedVector::from_f32(query);
                1.0 - query_bits.hamming_similarity(q)
            }
        }
    }

    /// Memory footprint of the stored payload, in bytes.
    #[must_use]
    pub fn memory_size(&self) -> usize {
        match self {
            Self::Full(v) => v.len() * std::mem::size_of::<f32>(),
            Self::Scalar(q) => q.memory_size(),
            Self::Binary(q) => q.memory_size(),
        }
    }
}

/// Codec trait abstracting over quantization strategy (`spec.md` §9).
pub trait QuantCodec: Send + Sync {
    /// Encodes a full-precision vector into this codec's storage form.
    fn encode(&self, vector: &[f32]) -> EncodedVector;
    /// The [`QuantizationMode`] this codec implements.
    fn mode(&self) -> QuantizationMode;
}

/// No quantization: vectors are stored verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoneCodec;

impl QuantCodec for NoneCodec {
    fn encode(&self, vector: &[f32]) -> EncodedVector {
        EncodedVector::Full(vector.to_vec())
    }

    fn mode(&self) -> QuantizationMode {
        QuantizationMode::None
    }
}

/// 8-bit scalar quantization codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScalarCodec;

impl QuantCodec for ScalarCodec {
    fn encode(&self, vector: &[f32]) -> EncodedVector {
        EncodedVector::Scalar(ScalarQuantizedVector::from_f32(vector))
    }

    fn mode(&self) -> QuantizationMode {
        QuantizationMode::Scalar
    }
}

/// 1-bit binary quantization codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryCodec;

impl QuantCodec for BinaryCodec {
    fn encode(&self, vector: &[f32]) -> EncodedVector {
        EncodedVector::Binary(BinaryQuantizedVector::from_f32(vector))
    }

    fn mode(&self) -> QuantizationMode {
        QuantizationMode::Binary
    }
}

/// Instantiates the codec matching a [`QuantizationMode`].
#[must_use]
pub fn codec_for(mode: QuantizationMode) -> Box<dyn QuantCodec> {
    match mode {
        QuantizationMode::None => Box::new(NoneCodec),
        QuantizationMode::Scalar => Box::new(ScalarCodec),
        QuantizationMode::Binary => Box::new(BinaryCodec),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_codec_round_trips_exactly() {
        let codec = codec_for(QuantizationMode::None);
        let v = vec![1.0, -2.0, 3.5];
        let encoded = codec.encode(&v);
        assert_eq!(encoded.to_f32(), v);
    }

    #[test]
    fn scalar_codec_is_approximately_reversible() {
        let codec = codec_for(QuantizationMode::Scalar);
        let v = vec![1.0, -2.0, 3.5, 0.25];
        let encoded = codec.encode(&v);
        let back = encoded.to_f32();
        for (a, b) in v.iter().zip(back.iter()) {
            assert!((a - b).abs() < 0.05);
        }
    }

    #[test]
    fn distance_to_self_is_near_zero_for_full_and_scalar() {
        let v = vec![0.3, -0.1, 0.9, 0.4];
        for mode in [QuantizationMode::None, QuantizationMode::Scalar] {
            let codec = codec_for(mode);
            let encoded = codec.encode(&v);
            assert!(encoded.distance_to(&v) < 0.02, "mode {mode:?}");
        }
    }
}
