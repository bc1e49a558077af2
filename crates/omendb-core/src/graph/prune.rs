//! Robust prune: the alpha-RNG neighbor diversification rule
//! (`spec.md` §4.3.5).

use super::ordered_float::OrderedFloat;

/// Selects at most `r_max` diverse neighbors for `p` from the candidate set
/// `candidates` (node id, distance-to-p pairs), applying the alpha-RNG rule:
/// a candidate is dropped once some already-selected, closer candidate
/// dominates it (`d(v, p*) < alpha * d(v, p)`).
///
/// `distance` computes the true pairwise distance between two candidate
/// node ids (not to `p`), used to evaluate domination.
pub(crate) fn robust_prune<F>(
    candidates: &[(u32, f32)],
    r_max: usize,
    alpha: f32,
    mut distance: F,
) -> Vec<u32>
where
    F: FnMut(u32, u32) -> f32,
{
    let mut remaining: Vec<(u32, f32)> = candidates.to_vec();
    remaining.sort_by_key(|&(_, d)| OrderedFloat(d));

    let mut selected = Vec::with_capacity(r_max.min(remaining.len()));

    while let Some((p_star, _)) = remaining.first().copied() {
        if selected.len() >= r_max {
            break;
        }
        selected.push(p_star);
        remaining.remove(0);
        remaining.retain(|&(v, d_v_p)| {
            let d_v_pstar = distance(v, p_star);
            d_v_pstar >= alpha * d_v_p
        });
    }

    selected
}
