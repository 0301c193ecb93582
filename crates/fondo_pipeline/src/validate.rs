//! crates/fondo_pipeline/src/validate.rs
//! Structural & semantic validation before any computation.
//!
//! Produces a deterministic report (formula order, then dataset order) and
//! the list of *active* indicators: those in the formula that every entity
//! carries. Warnings never block a run; any Error does.

use serde::Serialize;

use fondo_core::determinism::sort_entities_by_id;
use fondo_core::variables::validate_domains;
use fondo_core::{EntityId, FormulaSpec, IndicatorId, IndicatorTable};

use crate::PipelineError;

/// Issue code for a formula indicator absent from the dataset.
pub const CODE_INDICATOR_MISSING: &str = "indicator.missing";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
}

/// pass = no Error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub pass: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    /// `Err` on the first blocking issue. Missing indicators get their own bucket.
    pub fn into_result(self) -> Result<(), PipelineError> {
        let errors: Vec<&ValidationIssue> = self.errors().collect();
        let Some(first) = errors.first() else { return Ok(()) };
        let joined = errors.iter().map(|i| i.message.as_str()).collect::<Vec<_>>().join("; ");
        if first.code == CODE_INDICATOR_MISSING {
            Err(PipelineError::MissingIndicator(joined))
        } else {
            Err(PipelineError::Validate(joined))
        }
    }
}

#[derive(Clone, Debug)]
pub struct Checked {
    pub report: ValidationReport,
    /// Formula indicators usable for this dataset, in formula order.
    pub active: Vec<IndicatorId>,
}

fn issue(severity: Severity, code: &'static str, message: String) -> ValidationIssue {
    ValidationIssue { severity, code, message }
}

fn list(mut ids: Vec<EntityId>) -> String {
    sort_entities_by_id(&mut ids);
    ids.iter().map(EntityId::as_str).collect::<Vec<_>>().join(", ")
}

pub fn validate(table: &IndicatorTable, formula: &FormulaSpec) -> Checked {
    use Severity::*;
    let mut issues = Vec::new();
    let mut active = Vec::new();

    // A) Formula domains
    if let Err(e) = validate_domains(formula) {
        issues.push(issue(Error, "formula.domain", format!("formula '{}': {e}", formula.name)));
    }

    // B) Dataset shape
    if let Err(e) = table.check() {
        issues.push(issue(Error, "dataset.shape", e.to_string()));
    }

    // C) Indicator presence
    for ind in &formula.indicators {
        let id = ind.id.as_str();
        if !table.has_column(id) {
            if formula.strict_indicators {
                issues.push(issue(
                    Error,
                    CODE_INDICATOR_MISSING,
                    format!("indicator '{id}' is not in the dataset"),
                ));
            } else {
                issues.push(issue(
                    Warning,
                    "indicator.skipped",
                    format!("indicator '{id}' is not in the dataset; its weight is ignored"),
                ));
            }
            continue;
        }
        let missing = table.missing_in(id);
        if !missing.is_empty() {
            issues.push(issue(
                Error,
                "indicator.incomplete",
                format!("indicator '{id}' has no value for: {}", list(missing)),
            ));
            continue;
        }
        active.push(ind.id.clone());
    }

    if active.is_empty() && !formula.indicators.is_empty() {
        issues.push(issue(Error, "indicator.none_active", "no formula indicator is usable".into()));
    } else {
        let active_sum: f64 = active
            .iter()
            .filter_map(|id| formula.indicator(id.as_str()))
            .map(|i| i.weight)
            .sum();
        if !active.is_empty() && active_sum <= 0.0 {
            issues.push(issue(
                Error,
                "weights.zero_active",
                "weights of the usable indicators sum to zero".into(),
            ));
        }
    }

    // D) Weight sum (informative; weights are always renormalized)
    let raw_sum = formula.weights().sum();
    if raw_sum > 0.0 && (raw_sum - 1.0).abs() > 1e-9 {
        issues.push(issue(
            Warning,
            "weights.renormalized",
            format!("weights sum to {:.4}; renormalized to 1", raw_sum),
        ));
    }

    // E) Prior-year column for the band corridor
    if let Some(bands) = &formula.bands {
        let col = bands.prior_column.as_str();
        let missing = table.missing_in(col);
        if !missing.is_empty() {
            issues.push(issue(
                Error,
                "prior.missing",
                format!("prior column '{col}' has no value for: {}", list(missing)),
            ));
        } else {
            let bad: Vec<EntityId> = table
                .entities
                .iter()
                .filter(|r| r.value(col).map_or(true, |v| v <= 0.0))
                .map(|r| r.entity.clone())
                .collect();
            if !bad.is_empty() {
                issues.push(issue(
                    Error,
                    "prior.non_positive",
                    format!("prior column '{col}' must be > 0 for: {}", list(bad)),
                ));
            }
        }
    }

    let pass = !issues.iter().any(|i| i.severity == Error);
    Checked { report: ValidationReport { pass, issues }, active }
}
