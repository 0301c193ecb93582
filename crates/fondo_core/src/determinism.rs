//! Determinism utilities: stable ordering of entities and index ranking.
//!
//! Floats are compared with `f64::total_cmp`, so the order is total and
//! independent of input order whenever ids are unique.

use core::cmp::Ordering;

use crate::tokens::EntityId;

/// Compare by score descending, then entity id ascending.
#[inline]
pub fn cmp_score_desc(a: (&EntityId, f64), b: (&EntityId, f64)) -> Ordering {
    match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.as_str().cmp(b.0.as_str()),
        o => o,
    }
}

/// Positions of `scores` ordered for a ranking table (best first).
pub fn rank_positions(ids: &[EntityId], scores: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..ids.len().min(scores.len())).collect();
    idx.sort_by(|&i, &j| cmp_score_desc((&ids[i], scores[i]), (&ids[j], scores[j])));
    idx
}

/// Sort entity ids ascending (lexicographic).
pub fn sort_entities_by_id(ids: &mut [EntityId]) {
    ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<EntityId> {
        v.iter().map(|s| EntityId::new(*s).unwrap()).collect()
    }

    #[test]
    fn ranks_by_score_then_id() {
        let e = ids(&["Norte", "Central", "Sur"]);
        let order = rank_positions(&e, &[0.5, 0.9, 0.5]);
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn sorts_ids() {
        let mut e = ids(&["b", "a", "c"]);
        sort_entities_by_id(&mut e);
        assert_eq!(e, ids(&["a", "b", "c"]));
    }
}
