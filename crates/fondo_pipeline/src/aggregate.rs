//! AGGREGATE stage: renormalize the weights over the active indicators and
//! build the composite index.

use tracing::{debug, warn};

use fondo_algo::{aggregate, CompositeIndex};
use fondo_core::{FormulaSpec, IndicatorId, WeightVector};

use crate::normalize::NormalizedTable;
use crate::PipelineError;

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregated {
    /// Sum of the configured weights, before renormalization.
    pub weight_sum: f64,
    /// Weights actually applied (active indicators, summing to 1).
    pub weights: WeightVector,
    pub composite: CompositeIndex,
}

pub fn aggregate_index(
    normalized: &NormalizedTable,
    formula: &FormulaSpec,
    active: &[IndicatorId],
    n_entities: usize,
) -> Result<Aggregated, PipelineError> {
    let weight_sum = formula.weights().sum();

    let mut active_weights = formula.weights();
    active_weights.retain(|id| active.contains(id));
    let weights = active_weights
        .normalized()
        .map_err(|e| PipelineError::Aggregate(e.to_string()))?;

    let composite = aggregate(&normalized.value_columns(), &weights, n_entities)
        .map_err(|e| PipelineError::Aggregate(e.to_string()))?;

    if composite.degenerate {
        warn!("composite index is identical for every entity; using 0.5");
    }
    debug!(weight_sum, indicators = composite.used.len(), "aggregated");

    Ok(Aggregated { weight_sum, weights, composite })
}
