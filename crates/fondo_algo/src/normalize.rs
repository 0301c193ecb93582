//! Direction-aware min-max normalization of one indicator column.
//!
//! - positive: `(v - min) / (max - min)`
//! - negative: `(max - v) / (max - min)`
//! - `max == min`: every entry maps to `0.5` and the column is flagged
//!   degenerate so callers can surface a warning.

use fondo_core::Direction;

use crate::AlgoError;

/// Value assigned to every entry of a constant column.
pub const DEGENERATE_FILL: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedColumn {
    pub values: Vec<f64>,
    pub min: f64,
    pub max: f64,
    pub degenerate: bool,
}

/// Normalize `values` into [0, 1] and report the observed range.
pub fn normalize_column(values: &[f64], direction: Direction) -> Result<NormalizedColumn, AlgoError> {
    if values.is_empty() {
        return Err(AlgoError::Empty);
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(AlgoError::InvalidArgument("non-finite indicator value"));
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max == min {
        return Ok(NormalizedColumn {
            values: vec![DEGENERATE_FILL; values.len()],
            min,
            max,
            degenerate: true,
        });
    }

    let span = max - min;
    let out = values
        .iter()
        .map(|&v| match direction {
            Direction::Positive => (v - min) / span,
            Direction::Negative => (max - v) / span,
        })
        .collect();

    Ok(NormalizedColumn { values: out, min, max, degenerate: false })
}

/// Normalized values only.
#[inline]
pub fn normalize(values: &[f64], direction: Direction) -> Result<Vec<f64>, AlgoError> {
    normalize_column(values, direction).map(|c| c.values)
}
