//! Loader: read the local JSON inputs (dataset, formula or preset), check the
//! table invariants and record canonical input digests for the run record.
//! No network I/O.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use fondo_core::{presets, FormulaSpec, IndicatorTable};

use crate::hasher::{sha256_canonical, sha256_canonical_value};
use crate::manifest::{self, FormulaSource, ManifestError, ResolvedManifest};
use crate::IoError;

/// sha256 (canonical JSON) of the inputs that produced a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputDigests {
    pub dataset_sha256: String,
    pub formula_sha256: String,
}

/// Everything the pipeline needs from disk.
#[derive(Debug, Clone)]
pub struct LoadedInputs {
    pub table: IndicatorTable,
    pub formula: FormulaSpec,
    pub formula_source: FormulaSource,
    pub dataset_path: PathBuf,
    pub digests: InputDigests,
}

pub fn read_json_value(path: &Path) -> Result<Value, IoError> {
    let bytes = fs::read(path).map_err(|e| IoError::Path(format!("{} ({e})", path.display())))?;
    serde_json::from_slice(&bytes).map_err(|e| IoError::Json {
        pointer: path.display().to_string(),
        msg: e.to_string(),
    })
}

fn from_value<T: serde::de::DeserializeOwned>(path: &Path, v: Value) -> Result<T, IoError> {
    serde_json::from_value(v).map_err(|e| IoError::Json {
        pointer: path.display().to_string(),
        msg: e.to_string(),
    })
}

/// Parse a dataset file and check it (non-empty, unique entities).
/// Returns the table and its canonical digest.
pub fn load_dataset(path: &Path) -> Result<(IndicatorTable, String), IoError> {
    let v = read_json_value(path)?;
    let digest = sha256_canonical_value(&v);
    let table: IndicatorTable = from_value(path, v)?;
    table
        .check()
        .map_err(|e| IoError::Invalid(format!("{}: {e}", path.display())))?;
    Ok((table, digest))
}

/// Parse a formula file. Domain checks run later, after CLI overrides.
pub fn load_formula(path: &Path) -> Result<(FormulaSpec, String), IoError> {
    let v = read_json_value(path)?;
    let digest = sha256_canonical_value(&v);
    Ok((from_value(path, v)?, digest))
}

pub fn load_preset(name: &str) -> Result<(FormulaSpec, String), IoError> {
    let f = presets::by_name(name).ok_or_else(|| ManifestError::UnknownPreset(name.to_string()))?;
    let digest = sha256_canonical(&f)?;
    Ok((f, digest))
}

pub fn load_inputs(dataset_path: &Path, source: &FormulaSource) -> Result<LoadedInputs, IoError> {
    let (table, dataset_sha256) = load_dataset(dataset_path)?;
    let (formula, formula_sha256) = match source {
        FormulaSource::File(p) => load_formula(p)?,
        FormulaSource::Preset(name) => load_preset(name)?,
    };
    Ok(LoadedInputs {
        table,
        formula,
        formula_source: source.clone(),
        dataset_path: dataset_path.to_path_buf(),
        digests: InputDigests { dataset_sha256, formula_sha256 },
    })
}

/// Manifest → (verified) inputs. Expectations on the formula id are left to
/// the caller, since overrides change the fingerprint.
pub fn load_all_from_manifest(path: &Path) -> Result<(LoadedInputs, ResolvedManifest), IoError> {
    let resolved = manifest::load_and_resolve(path)?;
    let loaded = load_inputs(&resolved.dataset_path, &resolved.formula)?;
    Ok((loaded, resolved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_include;
    use serde_json::json;

    fn write(dir: &Path, name: &str, v: &Value) -> PathBuf {
        let p = dir.join(name);
        fs::write(&p, serde_json::to_vec_pretty(v).unwrap()).unwrap();
        p
    }

    fn dataset() -> Value {
        json!({"entities": [
            {"entity": "Colima", "values": {"Pob": 731391.0, "Asignacion_2025": 180.5}},
            {"entity": "Yucatán", "values": {"Pob": 2320898.0, "Asignacion_2025": 300.0}}
        ]})
    }

    #[test]
    fn loads_dataset_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "d.json", &dataset());
        let (t, digest) = load_dataset(&p).unwrap();
        assert_eq!(t.entity_ids().iter().map(|e| e.as_str()).collect::<Vec<_>>(), ["Colima", "Yucatán"]);
        assert_eq!(digest, sha256_canonical_value(&dataset()));
    }

    #[test]
    fn duplicate_entity_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "d.json", &json!({"entities": [
            {"entity": "A", "values": {}}, {"entity": "A", "values": {}}
        ]}));
        assert!(matches!(load_dataset(&p), Err(IoError::Invalid(_))));
    }

    #[test]
    fn malformed_json_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("broken.json");
        fs::write(&p, b"{ not json").unwrap();
        match load_dataset(&p) {
            Err(IoError::Json { pointer, .. }) => assert!(pointer.ends_with("broken.json")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn preset_serializes_with_defaults() {
        let (f, _) = load_preset("fofisp").unwrap();
        assert_json_include!(
            actual: serde_json::to_value(&f).unwrap(),
            expected: json!({"epsilon": 0.05, "redistribution": "single_pass", "strict_indicators": true})
        );
        assert!(load_preset("nope").is_err());
    }

    #[test]
    fn manifest_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "d.json", &dataset());
        let formula = json!({
            "name": "mini",
            "indicators": [{"id": "Pob", "direction": "positive", "weight": 1.0}],
            "epsilon": 0.05, "budget": 480.5,
            "bands": {"prior_column": "Asignacion_2025", "lower_pct": 0.1, "upper_pct": 0.1}
        });
        write(dir.path(), "f.json", &formula);
        let m = write(dir.path(), "manifest.json", &json!({
            "dataset_path": "d.json",
            "formula_path": "f.json",
            "inputs_sha256": {"formula": sha256_canonical_value(&formula)}
        }));

        let (loaded, resolved) = load_all_from_manifest(&m).unwrap();
        assert_eq!(loaded.table.len(), 2);
        assert_eq!(loaded.formula.name, "mini");
        assert_eq!(loaded.digests.formula_sha256, sha256_canonical_value(&formula));
        assert!(matches!(resolved.formula, FormulaSource::File(_)));
    }
}
