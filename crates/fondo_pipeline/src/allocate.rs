//! ALLOCATE stage: distribute the budget by shifted index.
//!
//! With `bands`, the prior-year column drives the corridor and the remainder is
//! redistributed per the formula's mode. Without, allocation is proportional
//! only and the band columns are absent.

use serde::Serialize;
use tracing::{debug, warn};

use fondo_algo::allocation::{allocate_with_mode, proportional, AllocationRow, Bands};
use fondo_core::{FormulaSpec, IndicatorId, IndicatorTable, RedistributionMode};

use crate::PipelineError;

/// One entity's allocation columns. Band columns are `None` for unbanded formulas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationOut {
    pub share: f64,
    pub allocation: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prior: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surplus: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deficit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clamped: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remainder_share: Option<f64>,
    pub final_allocation: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_variation: Option<f64>,
}

impl From<&AllocationRow> for AllocationOut {
    fn from(r: &AllocationRow) -> Self {
        AllocationOut {
            share: r.share,
            allocation: r.allocation,
            prior: Some(r.prior),
            variation: Some(r.variation),
            band_min: Some(r.band_min),
            band_max: Some(r.band_max),
            surplus: Some(r.surplus),
            deficit: Some(r.deficit),
            clamped: Some(r.clamped),
            eligible: Some(r.eligible),
            remainder_share: Some(r.remainder_share),
            final_allocation: r.final_allocation,
            final_variation: Some(r.final_variation),
        }
    }
}

/// Corridor totals; present only for banded formulas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandSummary {
    pub prior_column: IndicatorId,
    pub lower_pct: f64,
    pub upper_pct: f64,
    pub surplus_total: f64,
    pub deficit_total: f64,
    pub remainder: f64,
    pub eligible_count: usize,
    pub undistributed: f64,
    pub redistribution: RedistributionMode,
    pub passes: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocated {
    pub rows: Vec<AllocationOut>,
    pub final_total: f64,
    pub band: Option<BandSummary>,
}

pub fn allocate_budget(
    shifted: &[f64],
    table: &IndicatorTable,
    formula: &FormulaSpec,
) -> Result<Allocated, PipelineError> {
    let Some(spec) = &formula.bands else {
        let p = proportional(shifted, formula.budget)?;
        let rows: Vec<AllocationOut> = p
            .shares
            .iter()
            .zip(&p.allocations)
            .map(|(&share, &allocation)| AllocationOut {
                share,
                allocation,
                prior: None,
                variation: None,
                band_min: None,
                band_max: None,
                surplus: None,
                deficit: None,
                clamped: None,
                eligible: None,
                remainder_share: None,
                final_allocation: allocation,
                final_variation: None,
            })
            .collect();
        let final_total = rows.iter().map(|r| r.final_allocation).sum();
        debug!(final_total, "proportional allocation (no corridor)");
        return Ok(Allocated { rows, final_total, band: None });
    };

    let prior = table.column(spec.prior_column.as_str()).ok_or_else(|| {
        PipelineError::Validate(format!("prior column '{}' is incomplete", spec.prior_column))
    })?;
    let bands = Bands::new(spec.lower_pct, spec.upper_pct)?;
    let a = allocate_with_mode(shifted, formula.budget, &prior, bands, formula.redistribution)?;

    if a.undistributed != 0.0 {
        warn!(
            undistributed = a.undistributed,
            eligible = a.eligible_count,
            "remainder could not be fully redistributed inside the corridor"
        );
    }
    debug!(
        remainder = a.remainder,
        eligible = a.eligible_count,
        passes = a.passes,
        mode = a.mode.as_str(),
        "banded allocation"
    );

    Ok(Allocated {
        rows: a.rows.iter().map(AllocationOut::from).collect(),
        final_total: a.final_total,
        band: Some(BandSummary {
            prior_column: spec.prior_column.clone(),
            lower_pct: spec.lower_pct,
            upper_pct: spec.upper_pct,
            surplus_total: a.surplus_total,
            deficit_total: a.deficit_total,
            remainder: a.remainder,
            eligible_count: a.eligible_count,
            undistributed: a.undistributed,
            redistribution: a.mode,
            passes: a.passes,
        }),
    })
}
