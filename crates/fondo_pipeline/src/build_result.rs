//! BUILD_RESULT: assemble the per-entity table, the ranking and the summary,
//! then derive `RES:` from the canonical bytes of everything except the id.
//!
//! Entities keep dataset order; the ranking is score-descending with entity id
//! as the tie-break, so the document is identical for identical inputs.

use std::collections::BTreeMap;

use serde::Serialize;

use fondo_core::determinism::rank_positions;
use fondo_core::ids::{FormulaId, ResultId};
use fondo_core::{EntityId, FormulaSpec, IndicatorId, IndicatorTable, RedistributionMode, WeightVector};
use fondo_io::hasher::res_id_from_canonical;

use crate::aggregate::Aggregated;
use crate::allocate::{Allocated, AllocationOut, BandSummary};
use crate::normalize::NormalizedTable;
use crate::validate::ValidationReport;
use crate::PipelineError;

pub const CODE_DEGENERATE_COLUMN: &str = "indicator.degenerate";
pub const CODE_DEGENERATE_COMPOSITE: &str = "composite.degenerate";
pub const CODE_UNDISTRIBUTED: &str = "allocation.undistributed";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityResult {
    pub entity: EntityId,
    pub raw: BTreeMap<IndicatorId, f64>,
    pub normalized: BTreeMap<IndicatorId, f64>,
    pub composite_raw: f64,
    pub composite_final: f64,
    pub shifted_index: f64,
    #[serde(flatten)]
    pub allocation: AllocationOut,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    pub rank: u32,
    pub entity: EntityId,
    pub composite_final: f64,
    pub final_allocation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub entity_count: usize,
    /// Configured weights summed before renormalization.
    pub weight_sum: f64,
    pub weights: WeightVector,
    pub epsilon: f64,
    pub budget: f64,
    pub redistribution: RedistributionMode,
    pub final_total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<BandSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultBody {
    pub formula_id: FormulaId,
    pub formula_name: String,
    pub entities: Vec<EntityResult>,
    pub ranking: Vec<RankEntry>,
    pub summary: Summary,
    pub warnings: Vec<Warning>,
}

/// `result.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultDoc {
    pub id: ResultId,
    #[serde(flatten)]
    pub body: ResultBody,
}

impl std::ops::Deref for ResultDoc {
    type Target = ResultBody;
    fn deref(&self) -> &ResultBody {
        &self.body
    }
}

pub struct ResultInputs<'a> {
    pub formula: &'a FormulaSpec,
    pub formula_id: &'a FormulaId,
    pub table: &'a IndicatorTable,
    pub active: &'a [IndicatorId],
    pub normalized: &'a NormalizedTable,
    pub aggregated: &'a Aggregated,
    pub shifted: &'a [f64],
    pub allocated: &'a Allocated,
    pub validation: &'a ValidationReport,
}

pub fn build_result(inp: ResultInputs<'_>) -> Result<ResultDoc, PipelineError> {
    let n = inp.table.len();
    let composite = &inp.aggregated.composite;
    if composite.scaled.len() != n || inp.shifted.len() != n || inp.allocated.rows.len() != n {
        return Err(PipelineError::Build(format!(
            "stage outputs disagree on entity count (expected {n})"
        )));
    }

    let entities: Vec<EntityResult> = inp
        .table
        .entities
        .iter()
        .enumerate()
        .map(|(i, row)| EntityResult {
            entity: row.entity.clone(),
            raw: inp
                .active
                .iter()
                .filter_map(|id| row.value(id.as_str()).map(|v| (id.clone(), v)))
                .collect(),
            normalized: inp
                .active
                .iter()
                .filter_map(|id| inp.normalized.value(id.as_str(), i).map(|v| (id.clone(), v)))
                .collect(),
            composite_raw: composite.raw[i],
            composite_final: composite.scaled[i],
            shifted_index: inp.shifted[i],
            allocation: inp.allocated.rows[i].clone(),
        })
        .collect();

    let ids = inp.table.entity_ids();
    let ranking = rank_positions(&ids, &composite.scaled)
        .into_iter()
        .enumerate()
        .map(|(pos, i)| RankEntry {
            rank: pos as u32 + 1,
            entity: ids[i].clone(),
            composite_final: composite.scaled[i],
            final_allocation: inp.allocated.rows[i].final_allocation,
        })
        .collect();

    let body = ResultBody {
        formula_id: inp.formula_id.clone(),
        formula_name: inp.formula.name.clone(),
        entities,
        ranking,
        summary: Summary {
            entity_count: n,
            weight_sum: inp.aggregated.weight_sum,
            weights: inp.aggregated.weights.clone(),
            epsilon: inp.formula.epsilon,
            budget: inp.formula.budget,
            redistribution: inp.formula.redistribution,
            final_total: inp.allocated.final_total,
            band: inp.allocated.band.clone(),
        },
        warnings: collect_warnings(&inp),
    };

    let id = res_id_from_canonical(&body)?;
    Ok(ResultDoc { id, body })
}

fn collect_warnings(inp: &ResultInputs<'_>) -> Vec<Warning> {
    let mut out: Vec<Warning> = inp
        .validation
        .warnings()
        .map(|w| Warning { code: w.code.to_string(), message: w.message.clone() })
        .collect();

    for id in inp.normalized.degenerate() {
        out.push(Warning {
            code: CODE_DEGENERATE_COLUMN.into(),
            message: format!("indicator '{id}' is constant across entities; scored 0.5"),
        });
    }
    if inp.aggregated.composite.degenerate {
        out.push(Warning {
            code: CODE_DEGENERATE_COMPOSITE.into(),
            message: "composite index is constant across entities; scored 0.5".into(),
        });
    }
    if let Some(b) = &inp.allocated.band {
        if b.undistributed != 0.0 {
            out.push(Warning {
                code: CODE_UNDISTRIBUTED.into(),
                message: format!(
                    "{:.2} of the remainder could not be placed inside the corridor",
                    b.undistributed
                ),
            });
        }
    }
    out
}
