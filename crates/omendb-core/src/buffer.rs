//! Fixed-capacity write buffer absorbing inserts at O(1) before a flush
//! merges them into the graph (`spec.md` §4.2).

use crate::quantization::EncodedVector;

/// One occupied slot: an id paired with its (possibly quantized) vector.
struct Slot {
    id: String,
    vector: EncodedVector,
}

/// Dense, fixed-capacity append buffer with linear-scan top-k search.
///
/// Slots are contiguous `[0, size)`; deletion compacts by swap-removing the
/// tail slot into the freed index so indices stay dense (`spec.md` §4.2
/// invariants).
pub struct VectorBuffer {
    capacity: usize,
    slots: Vec<Slot>,
}

impl VectorBuffer {
    /// Creates an empty buffer with room for `capacity` vectors.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Current number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// `true` if no vectors are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// `true` if the buffer is at capacity and a flush is required before
    /// further inserts.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Remaining free slots before the buffer is full.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.slots.len())
    }

    /// Total bytes occupied by buffered vector payloads (`spec.md` §6
    /// `stats().mb_*`).
    #[must_use]
    pub fn memory_size(&self) -> usize {
        self.slots.iter().map(|s| s.vector.memory_size()).sum()
    }

    /// Appends `(id, vector)` pairs already encoded by the store's codec,
    /// stopping once the buffer is full. Returns the number actually added.
    /// Caller is responsible for uniqueness (`spec.md` duplicate handling
    /// happens one layer up, in the coordinator, where the id map is
    /// authoritative).
    pub fn add_batch(&mut self, items: Vec<(String, EncodedVector)>) -> usize {
        let mut added = 0;
        for (id, vector) in items {
            if self.is_full() {
                break;
            }
            self.slots.push(Slot { id, vector });
            added += 1;
        }
        added
    }

    /// Removes `id`, compacting by moving the last slot into the freed
    /// position. Returns `true` if `id` was present.
    pub fn delete(&mut self, id: &str) -> bool {
        if let Some(pos) = self.slots.iter().position(|s| s.id == id) {
            self.slots.swap_remove(pos);
            true
        } else {
            false
        }
    }

    /// Returns the dequantized vector for `id`, if buffered.
    #[must_use]
    pub fn get_vector_by_id(&self, id: &str) -> Option<Vec<f32>> {
        self.slots
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.vector.to_f32())
    }

    /// `true` if `id` is currently buffered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.slots.iter().any(|s| s.id == id)
    }

    /// Linear-scan top-k search by ascending cosine distance to `query`.
    #[must_use]
    pub fn search_linear(&self, query: &[f32], k: usize) -> Vec<(String, f32)> {
        let mut scored: Vec<(String, f32)> = self
            .slots
            .iter()
            .map(|s| (s.id.clone(), s.vector.distance_to(query)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);
        scored
    }

    /// Drains and returns all buffered `(id, vector)` pairs, leaving the
    /// buffer empty. Used by the flush path to hand items to `add_batch` on
    /// the graph.
    pub fn drain(&mut self) -> Vec<(String, EncodedVector)> {
        self.slots
            .drain(..)
            .map(|s| (s.id, s.vector))
            .collect()
    }

    /// Empties the buffer without returning its contents.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
