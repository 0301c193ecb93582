//! Weighted sum of normalized columns, re-normalized to [0, 1].
//!
//! Indicators carried by the weight vector but absent from `columns` are
//! skipped; whether that is acceptable is decided upstream.

use std::collections::BTreeMap;

use fondo_core::{Direction, IndicatorId, WeightVector};

use crate::normalize::normalize_column;
use crate::{check_len, AlgoError};

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeIndex {
    /// `Σ norm[e][i] × w[i]` per entity.
    pub raw: Vec<f64>,
    /// `raw` min-max normalized (positive direction).
    pub scaled: Vec<f64>,
    /// All raw composites equal; `scaled` is uniformly 0.5.
    pub degenerate: bool,
    /// Indicators that contributed, in id order.
    pub used: Vec<IndicatorId>,
}

/// Aggregate `columns` (each of length `n_entities`) with `weights`.
pub fn aggregate(
    columns: &BTreeMap<IndicatorId, Vec<f64>>,
    weights: &WeightVector,
    n_entities: usize,
) -> Result<CompositeIndex, AlgoError> {
    if n_entities == 0 {
        return Err(AlgoError::Empty);
    }

    let mut raw = vec![0.0_f64; n_entities];
    let mut used = Vec::new();

    for (id, w) in weights.iter() {
        if !w.is_finite() || w < 0.0 {
            return Err(AlgoError::InvalidArgument("weight must be finite and >= 0"));
        }
        let Some(col) = columns.get(id) else { continue };
        check_len(n_entities, col.len())?;
        for (acc, v) in raw.iter_mut().zip(col) {
            *acc += v * w;
        }
        used.push(id.clone());
    }

    let scaled = normalize_column(&raw, Direction::Positive)?;
    Ok(CompositeIndex {
        raw,
        scaled: scaled.values,
        degenerate: scaled.degenerate,
        used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> IndicatorId { IndicatorId::new(s).unwrap() }

    #[test]
    fn weighted_sum_then_rescaled() {
        let mut cols = BTreeMap::new();
        cols.insert(id("a"), vec![0.0, 1.0, 0.5]);
        cols.insert(id("b"), vec![1.0, 0.0, 0.5]);
        let w: WeightVector = [(id("a"), 0.75), (id("b"), 0.25)].into_iter().collect();

        let c = aggregate(&cols, &w, 3).unwrap();
        assert_eq!(c.raw, vec![0.25, 0.75, 0.5]);
        assert_eq!(c.scaled, vec![0.0, 1.0, 0.5]);
        assert!(!c.degenerate);
        assert_eq!(c.used, vec![id("a"), id("b")]);
    }

    #[test]
    fn absent_indicator_is_skipped() {
        let mut cols = BTreeMap::new();
        cols.insert(id("a"), vec![0.0, 1.0]);
        let w: WeightVector = [(id("a"), 0.5), (id("ghost"), 0.5)].into_iter().collect();
        let c = aggregate(&cols, &w, 2).unwrap();
        assert_eq!(c.used, vec![id("a")]);
        assert_eq!(c.raw, vec![0.0, 0.5]);
    }

    #[test]
    fn identical_composites_are_half() {
        let mut cols = BTreeMap::new();
        cols.insert(id("a"), vec![0.0, 1.0]);
        cols.insert(id("b"), vec![1.0, 0.0]);
        let w: WeightVector = [(id("a"), 0.5), (id("b"), 0.5)].into_iter().collect();
        let c = aggregate(&cols, &w, 2).unwrap();
        assert!(c.degenerate);
        assert_eq!(c.scaled, vec![0.5, 0.5]);
    }

    #[test]
    fn ragged_column_rejected() {
        let mut cols = BTreeMap::new();
        cols.insert(id("a"), vec![0.0]);
        let w: WeightVector = [(id("a"), 1.0)].into_iter().collect();
        assert_eq!(
            aggregate(&cols, &w, 2),
            Err(AlgoError::LengthMismatch { expected: 2, found: 1 })
        );
    }
}
