//! fondo_pipeline: deterministic pipeline surface
//! (load → validate → normalize → aggregate → shift → allocate → build result → build run record).
//!
//! This crate does no file writing; JSON/hashing goes through `fondo_io` and the
//! math through `fondo_algo`. Each invocation works on one immutable snapshot of
//! the inputs and returns fresh artifacts.

#![forbid(unsafe_code)]

use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use fondo_algo::AlgoError;
use fondo_core::ids::FormulaId;
use fondo_core::FormulaSpec;
use fondo_io::loader::{self, LoadedInputs};
use fondo_io::manifest::{self, Expectations};
use fondo_io::{hasher, IoError};

pub mod load;
pub mod validate;
pub mod normalize;
pub mod aggregate;
pub mod shift;
pub mod allocate;
pub mod build_result;
pub mod build_run_record;

pub use allocate::{AllocationOut, BandSummary};
pub use build_result::{EntityResult, RankEntry, ResultBody, ResultDoc, Summary, Warning};
pub use build_run_record::{RunRecordBody, RunRecordDoc};
pub use load::Overrides;
pub use validate::{Severity, ValidationIssue, ValidationReport};

/// Placeholder timestamp used when the caller supplies none.
pub const EPOCH_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// Engine identifiers echoed in the run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineMeta {
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub build: String,
}

pub fn engine_identifiers() -> EngineMeta {
    EngineMeta {
        vendor: "fondo".to_string(),
        name: "fondo_engine".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: option_env!("FONDO_BUILD").unwrap_or("dev").to_string(),
    }
}

/// Pipeline context: inputs already loaded by `fondo_io`, plus the layered
/// overrides and run metadata.
#[derive(Debug, Clone)]
pub struct PipelineCtx {
    pub loaded: LoadedInputs,
    pub overrides: Overrides,
    pub engine_meta: EngineMeta,
    /// RFC3339 UTC; normalized to seconds + `Z` in the run record.
    pub timestamp_utc: String,
    /// Manifest `expect` block, checked against the effective formula.
    pub expect: Option<Expectations>,
}

impl PipelineCtx {
    pub fn new(loaded: LoadedInputs) -> Self {
        Self {
            loaded,
            overrides: Overrides::default(),
            engine_meta: engine_identifiers(),
            timestamp_utc: EPOCH_TIMESTAMP.to_string(),
            expect: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutputs {
    pub result: ResultDoc,
    pub run_record: RunRecordDoc,
    /// Effective formula after overrides.
    pub formula: FormulaSpec,
    pub validation: ValidationReport,
}

/// Single error surface for the pipeline, one bucket per stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("io: {0}")]
    Io(String),
    #[error("validate: {0}")]
    Validate(String),
    #[error("missing indicator: {0}")]
    MissingIndicator(String),
    #[error("normalize: {0}")]
    Normalize(String),
    #[error("aggregate: {0}")]
    Aggregate(String),
    #[error("shift: {0}")]
    Shift(String),
    #[error("allocate: {0}")]
    Allocate(String),
    #[error("build: {0}")]
    Build(String),
    /// Input digest or formula expectation mismatch.
    #[error("verify: {0}")]
    Verify(String),
}

impl From<IoError> for PipelineError {
    fn from(e: IoError) -> Self {
        use PipelineError::*;
        match e {
            IoError::Path(m) => Io(m),
            IoError::Json { pointer, msg } => Validate(format!("json {pointer}: {msg}")),
            IoError::Hash(m) => Build(format!("hash: {m}")),
            IoError::Manifest(m) if m.is_verification() => Verify(m.to_string()),
            IoError::Manifest(m) => Validate(format!("manifest: {m}")),
            IoError::Invalid(m) => Validate(m),
        }
    }
}

impl From<hasher::HashError> for PipelineError {
    fn from(e: hasher::HashError) -> Self {
        PipelineError::Build(format!("hash: {e}"))
    }
}

/// Allocation is the last numeric stage; errors reaching here through `?`
/// come from it. Earlier stages map theirs explicitly.
impl From<AlgoError> for PipelineError {
    fn from(e: AlgoError) -> Self {
        PipelineError::Allocate(e.to_string())
    }
}

/// Formula ID: SHA-256 of the canonical effective formula.
pub fn compute_formula_id(formula: &FormulaSpec) -> Result<FormulaId, PipelineError> {
    Ok(hasher::formula_id(formula)?)
}

/// Apply overrides and run the checks only; nothing is computed.
pub fn validate_only(ctx: &PipelineCtx) -> Result<(FormulaSpec, ValidationReport), PipelineError> {
    let formula = load::apply_overrides(&ctx.loaded.formula, &ctx.overrides)?;
    let checked = validate::validate(&ctx.loaded.table, &formula);
    Ok((formula, checked.report))
}

/// Orchestrate the pipeline with a preloaded context.
pub fn run_with_ctx(ctx: PipelineCtx) -> Result<PipelineOutputs, PipelineError> {
    // LOAD: layer overrides over the loaded formula.
    let formula = load::apply_overrides(&ctx.loaded.formula, &ctx.overrides)?;
    debug!(formula = %formula.name, entities = ctx.loaded.table.len(), "pipeline start");

    // VALIDATE
    let checked = validate::validate(&ctx.loaded.table, &formula);
    checked.report.clone().into_result()?;
    let active = checked.active;

    let fid = compute_formula_id(&formula)?;
    manifest::enforce_expectations(ctx.expect.as_ref(), fid.as_str()).map_err(IoError::Manifest)?;

    // NORMALIZE → AGGREGATE → SHIFT → ALLOCATE
    let table = &ctx.loaded.table;
    let normalized = normalize::normalize_table(table, &formula, &active)?;
    let aggregated = aggregate::aggregate_index(&normalized, &formula, &active, table.len())?;
    let shifted = shift::shift_index(&aggregated.composite.scaled, formula.epsilon)?;
    let allocated = allocate::allocate_budget(&shifted, table, &formula)?;

    // BUILD_RESULT
    let result = build_result::build_result(build_result::ResultInputs {
        formula: &formula,
        formula_id: &fid,
        table,
        active: &active,
        normalized: &normalized,
        aggregated: &aggregated,
        shifted: &shifted,
        allocated: &allocated,
        validation: &checked.report,
    })?;

    // BUILD_RUN_RECORD
    let run_record = build_run_record::build_run_record(
        &ctx.timestamp_utc,
        &ctx.engine_meta,
        &fid,
        &ctx.loaded,
        &ctx.overrides,
        &result,
    )?;

    info!(
        formula = %formula.name,
        result_id = %result.id,
        run_id = %run_record.id,
        final_total = result.summary.final_total,
        "pipeline complete"
    );

    Ok(PipelineOutputs {
        result,
        run_record,
        formula,
        validation: checked.report,
    })
}

/// Convenience entry: load a manifest (verifying input digests), run the
/// pipeline and enforce the manifest's formula expectation.
pub fn run_from_manifest_path<P: AsRef<Path>>(
    path: P,
    overrides: Overrides,
    timestamp_utc: &str,
) -> Result<PipelineOutputs, PipelineError> {
    let (loaded, resolved) = loader::load_all_from_manifest(path.as_ref())?;
    let ctx = PipelineCtx {
        overrides,
        timestamp_utc: timestamp_utc.to_string(),
        expect: resolved.expect,
        ..PipelineCtx::new(loaded)
    };
    run_with_ctx(ctx)
}
