//! crates/fondo_report/src/structure.rs
//! Report data model and the mapper from `result.json` / `run_record.json`.
//! No I/O and no recomputation: every number shown is read from the artifacts
//! and only formatted here.

use std::collections::BTreeMap;

use serde_json::Value;

use fondo_core::ids::{ResultId, RunId};

use crate::format::{money, pct, signed_pct};
use crate::{ReportError, ResultArtifact, RunRecordArtifact};

// -------------------- Model root & sections (render order) --------------------

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ReportModel {
    pub cover: Cover,
    pub weights: WeightsBlock,
    pub allocation: Vec<AllocationLine>,
    pub band: Option<BandBlock>,
    pub totals: Totals,
    pub warnings: Vec<String>,
    pub integrity: Integrity,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Cover {
    pub title: String,
    pub entity_count: u64,
    pub budget: String,
    pub epsilon: String,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct WeightRow {
    pub indicator: String,
    pub weight: String,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct WeightsBlock {
    /// Applied (renormalized) weights, indicator order.
    pub rows: Vec<WeightRow>,
    /// Configured weights' sum, e.g. `"Suma: 88.38%"`.
    pub sum_label: String,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct AllocationLine {
    pub rank: u64,
    pub entity: String,
    pub index: String,
    pub share: String,
    pub allocation: String,
    pub prior: Option<String>,
    pub final_allocation: String,
    pub final_variation: Option<String>,
    pub eligible: Option<bool>,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct BandBlock {
    pub prior_column: String,
    /// `"-10.00% / +10.00%"`
    pub corridor: String,
    pub surplus_total: String,
    pub deficit_total: String,
    pub remainder: String,
    pub eligible_count: u64,
    pub redistribution: String,
    pub passes: u64,
    pub undistributed: String,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Totals {
    pub budget: String,
    pub final_total: String,
    /// Whether `final_total` matches the budget to the cent.
    pub balanced: bool,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Integrity {
    pub result_id: String,
    pub run_id: String,
    pub formula_id: String,
    pub engine: String,
    pub timestamp_utc: String,
    pub formula_source: String,
}

// -------------------- Mapping --------------------

/// Build the report model from already-parsed artifacts.
/// Missing required fields yield `ReportError::MissingField`.
pub fn build_model(result: &ResultArtifact, run: &RunRecordArtifact) -> Result<ReportModel, ReportError> {
    let budget = get_f64(result, "/summary/budget")?;
    let final_total = get_f64(result, "/summary/final_total")?;

    let cover = Cover {
        title: get_str(result, "/formula_name")?,
        entity_count: get_u64(result, "/summary/entity_count")?,
        budget: money(budget),
        epsilon: get_f64(result, "/summary/epsilon").map(|e| e.to_string())?,
    };

    let weights = WeightsBlock {
        rows: result
            .pointer("/summary/weights")
            .and_then(Value::as_object)
            .ok_or(ReportError::MissingField("/summary/weights"))?
            .iter()
            .map(|(k, v)| WeightRow {
                indicator: k.clone(),
                weight: v.as_f64().map(|w| pct(w, 2)).unwrap_or_default(),
            })
            .collect(),
        sum_label: format!("Suma: {}", pct(get_f64(result, "/summary/weight_sum")?, 2)),
    };

    let allocation = allocation_lines(result)?;

    let band = match result.pointer("/summary/band") {
        Some(b) if !b.is_null() => Some(BandBlock {
            prior_column: get_str(b, "/prior_column")?,
            corridor: format!(
                "{} / {}",
                signed_pct(-get_f64(b, "/lower_pct")?, 2),
                signed_pct(get_f64(b, "/upper_pct")?, 2)
            ),
            surplus_total: money(get_f64(b, "/surplus_total")?),
            deficit_total: money(get_f64(b, "/deficit_total")?),
            remainder: money(get_f64(b, "/remainder")?),
            eligible_count: get_u64(b, "/eligible_count")?,
            redistribution: get_str(b, "/redistribution")?,
            passes: get_u64(b, "/passes")?,
            undistributed: money(get_f64(b, "/undistributed")?),
        }),
        _ => None,
    };

    let totals = Totals {
        budget: money(budget),
        final_total: money(final_total),
        balanced: money(budget) == money(final_total),
    };

    let warnings = result
        .pointer("/warnings")
        .and_then(Value::as_array)
        .map(|ws| {
            ws.iter()
                .filter_map(|w| Some(format!("{}: {}", w.get("code")?.as_str()?, w.get("message")?.as_str()?)))
                .collect()
        })
        .unwrap_or_default();

    let integrity = integrity(result, run)?;

    Ok(ReportModel { cover, weights, allocation, band, totals, warnings, integrity })
}

/// Ranking order; per-entity columns are looked up by entity id.
fn allocation_lines(result: &Value) -> Result<Vec<AllocationLine>, ReportError> {
    let entities: BTreeMap<&str, &Value> = result
        .pointer("/entities")
        .and_then(Value::as_array)
        .ok_or(ReportError::MissingField("/entities"))?
        .iter()
        .filter_map(|e| Some((e.get("entity")?.as_str()?, e)))
        .collect();

    let ranking = result
        .pointer("/ranking")
        .and_then(Value::as_array)
        .ok_or(ReportError::MissingField("/ranking"))?;

    ranking
        .iter()
        .map(|r| {
            let name = get_str(r, "/entity")?;
            let e = entities
                .get(name.as_str())
                .ok_or(ReportError::Inconsistent("ranking entity not in entities"))?;
            Ok(AllocationLine {
                rank: get_u64(r, "/rank")?,
                index: pct(get_f64(e, "/composite_final")?, 2),
                share: pct(get_f64(e, "/share")?, 4),
                allocation: money(get_f64(e, "/allocation")?),
                prior: get_f64(e, "/prior").ok().map(money),
                final_allocation: money(get_f64(e, "/final_allocation")?),
                final_variation: get_f64(e, "/final_variation").ok().map(|v| signed_pct(v, 2)),
                eligible: e.get("eligible").and_then(Value::as_bool),
                entity: name,
            })
        })
        .collect()
}

fn integrity(result: &Value, run: &Value) -> Result<Integrity, ReportError> {
    let result_id: ResultId = get_str(result, "/id")?
        .parse()
        .map_err(|_| ReportError::Inconsistent("result id"))?;
    let run_id: RunId = get_str(run, "/id")?
        .parse()
        .map_err(|_| ReportError::Inconsistent("run id"))?;
    if get_str(run, "/outputs/result_id")? != result_id.as_str() {
        return Err(ReportError::Inconsistent("run record points at another result"));
    }

    let engine = format!(
        "{}/{} v{} ({})",
        get_str(run, "/engine/vendor").unwrap_or_else(|_| "fondo".into()),
        get_str(run, "/engine/name").unwrap_or_else(|_| "fondo_engine".into()),
        get_str(run, "/engine/version").unwrap_or_else(|_| "0.0.0".into()),
        get_str(run, "/engine/build").unwrap_or_else(|_| "dev".into()),
    );

    Ok(Integrity {
        result_id: result_id.to_string(),
        run_id: run_id.to_string(),
        formula_id: get_str(result, "/formula_id")?,
        engine,
        timestamp_utc: get_str(run, "/timestamp_utc")?,
        formula_source: get_str(run, "/inputs/formula_source").unwrap_or_else(|_| "unknown".into()),
    })
}

// -------------------- JSON helpers --------------------

fn get_str(root: &Value, ptr: &'static str) -> Result<String, ReportError> {
    root.pointer(ptr)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ReportError::MissingField(ptr))
}

fn get_f64(root: &Value, ptr: &'static str) -> Result<f64, ReportError> {
    root.pointer(ptr).and_then(Value::as_f64).ok_or(ReportError::MissingField(ptr))
}

fn get_u64(root: &Value, ptr: &'static str) -> Result<u64, ReportError> {
    root.pointer(ptr).and_then(Value::as_u64).ok_or(ReportError::MissingField(ptr))
}
