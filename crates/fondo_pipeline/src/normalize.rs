//! NORMALIZE stage: min-max each active indicator column, direction-aware.
//! Constant columns come back as 0.5 and are logged as degenerate.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use fondo_algo::{normalize_column, NormalizedColumn};
use fondo_core::{FormulaSpec, IndicatorId, IndicatorTable};

use crate::PipelineError;

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub columns: BTreeMap<IndicatorId, NormalizedColumn>,
}

impl NormalizedTable {
    pub fn degenerate(&self) -> impl Iterator<Item = &IndicatorId> {
        self.columns.iter().filter(|(_, c)| c.degenerate).map(|(id, _)| id)
    }

    /// Normalized value of `indicator` for the entity at `row`.
    pub fn value(&self, indicator: &str, row: usize) -> Option<f64> {
        self.columns.get(indicator).and_then(|c| c.values.get(row).copied())
    }

    /// Plain value columns, as the aggregator consumes them.
    pub fn value_columns(&self) -> BTreeMap<IndicatorId, Vec<f64>> {
        self.columns.iter().map(|(id, c)| (id.clone(), c.values.clone())).collect()
    }
}

pub fn normalize_table(
    table: &IndicatorTable,
    formula: &FormulaSpec,
    active: &[IndicatorId],
) -> Result<NormalizedTable, PipelineError> {
    let mut columns = BTreeMap::new();
    for id in active {
        let direction = formula
            .direction_of(id.as_str())
            .ok_or_else(|| PipelineError::MissingIndicator(format!("'{id}' is not in the formula")))?;
        let raw = table
            .column(id.as_str())
            .ok_or_else(|| PipelineError::MissingIndicator(format!("'{id}' is not in the dataset")))?;
        let col = normalize_column(&raw, direction)
            .map_err(|e| PipelineError::Normalize(format!("{id}: {e}")))?;
        if col.degenerate {
            warn!(indicator = %id, value = col.min, "degenerate indicator column; every entity scores 0.5");
        }
        debug!(indicator = %id, direction = direction.as_str(), min = col.min, max = col.max, "normalized");
        columns.insert(id.clone(), col);
    }
    Ok(NormalizedTable { columns })
}
