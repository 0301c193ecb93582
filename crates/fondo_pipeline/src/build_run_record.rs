//! BUILD_RUN_RECORD: what produced a result, with which inputs and overrides.
//!
//! `RUN:<timestamp>:<hash>`, where the hash covers the canonical record body
//! (everything but the id). The timestamp is caller-supplied, never read from
//! the clock here.

use std::path::Path;

use serde::Serialize;

use fondo_core::ids::{FormulaId, ResultId, RunId};
use fondo_io::hasher::{normalize_rfc3339_utc_seconds, run_id_from_canonical, sha256_canonical};
use fondo_io::loader::LoadedInputs;
use fondo_io::manifest::FormulaSource;

use crate::build_result::ResultDoc;
use crate::load::Overrides;
use crate::{EngineMeta, PipelineError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunInputs {
    pub dataset: String,
    pub dataset_sha256: String,
    /// `preset:<name>` or `file:<file name>`.
    pub formula_source: String,
    pub formula_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutputs {
    pub result_id: ResultId,
    pub result_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecordBody {
    pub timestamp_utc: String,
    pub engine: EngineMeta,
    pub formula_id: FormulaId,
    pub inputs: RunInputs,
    pub overrides: Overrides,
    pub outputs: RunOutputs,
}

/// `run_record.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecordDoc {
    pub id: RunId,
    #[serde(flatten)]
    pub body: RunRecordBody,
}

impl std::ops::Deref for RunRecordDoc {
    type Target = RunRecordBody;
    fn deref(&self) -> &RunRecordBody {
        &self.body
    }
}

/// Only the file name is recorded so the id doesn't depend on the checkout path.
fn file_label(p: &Path) -> String {
    p.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| p.display().to_string())
}

pub fn formula_source_label(src: &FormulaSource) -> String {
    match src {
        FormulaSource::Preset(name) => format!("preset:{name}"),
        FormulaSource::File(p) => format!("file:{}", file_label(p)),
    }
}

pub fn build_run_record(
    timestamp_utc: &str,
    engine: &EngineMeta,
    formula_id: &FormulaId,
    loaded: &LoadedInputs,
    overrides: &Overrides,
    result: &ResultDoc,
) -> Result<RunRecordDoc, PipelineError> {
    let ts = normalize_rfc3339_utc_seconds(timestamp_utc)
        .map_err(|e| PipelineError::Validate(e.to_string()))?;

    let body = RunRecordBody {
        timestamp_utc: ts.clone(),
        engine: engine.clone(),
        formula_id: formula_id.clone(),
        inputs: RunInputs {
            dataset: file_label(&loaded.dataset_path),
            dataset_sha256: loaded.digests.dataset_sha256.clone(),
            formula_source: formula_source_label(&loaded.formula_source),
            formula_sha256: loaded.digests.formula_sha256.clone(),
        },
        overrides: overrides.clone(),
        outputs: RunOutputs {
            result_id: result.id.clone(),
            result_sha256: sha256_canonical(result)?,
        },
    };

    let id = run_id_from_canonical(&ts, &body)?;
    Ok(RunRecordDoc { id, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn labels() {
        assert_eq!(formula_source_label(&FormulaSource::Preset("fasp".into())), "preset:fasp");
        let p = PathBuf::from("/tmp/some/dir/formula.json");
        assert_eq!(formula_source_label(&FormulaSource::File(p)), "file:formula.json");
    }
}
