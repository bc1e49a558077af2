//! Beam search (greedy graph traversal bounded to a candidate list of size
//! `L`) shared between build-time neighbor discovery and query-time search
//! (`spec.md` §4.3.4).

use rustc_hash::FxHashSet;

use super::ordered_float::OrderedFloat;

/// Runs greedy beam search from `start`, expanding the closest unexpanded
/// candidate's neighbors (via `neighbors_of`) and keeping the `l` closest
/// candidates seen so far (by `distance_to_query`), until every candidate in
/// the bounded list has been expanded.
///
/// Returns the candidate list sorted ascending by distance, length `<= l`.
/// Ties in distance are broken by ascending node id so results are
/// deterministic regardless of expansion order.
pub(crate) fn beam_search<N, D>(
    start: u32,
    l: usize,
    mut neighbors_of: N,
    mut distance_to_query: D,
) -> Vec<(u32, f32)>
where
    N: FnMut(u32) -> Vec<u32>,
    D: FnMut(u32) -> f32,
{
    let mut visited: FxHashSet<u32> = FxHashSet::default();
    let mut expanded: FxHashSet<u32> = FxHashSet::default();

    let start_dist = distance_to_query(start);
    visited.insert(start);
    let mut candidates = vec![(start, start_dist)];

    loop {
        let next = candidates
            .iter()
            .find(|(node, _)| !expanded.contains(node))
            .copied();
        let Some((node, _)) = next else {
            break;
        };
        expanded.insert(node);

        for neighbor in neighbors_of(node) {
            if visited.insert(neighbor) {
                let dist = distance_to_query(neighbor);
                insert_sorted(&mut candidates, (neighbor, dist));
            }
        }
        candidates.truncate(l);
    }

    candidates
}

fn insert_sorted(candidates: &mut Vec<(u32, f32)>, item: (u32, f32)) {
    let pos = candidates
        .partition_point(|&(node, dist)| (OrderedFloat(dist), node) <= (OrderedFloat(item.1), item.0));
    candidates.insert(pos, item);
}
