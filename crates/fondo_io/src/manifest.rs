// crates/fondo_io/src/manifest.rs
//
// Manifest: a small JSON file naming the run inputs.
// • Inputs are local paths only; anything with a scheme is rejected.
// • Exactly one formula source: `formula_path` (JSON file) or `preset` (built-in name).
// • Optional `inputs_sha256` digests are over canonical JSON bytes of the files.
// • Optional `expect.formula_id` pins the formula fingerprint after overrides.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use fondo_core::presets;

use crate::hasher::sha256_canonical_value;
use crate::{looks_like_url_strict, IoError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub dataset_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs_sha256: Option<InputDigests>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<Expectations>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputDigests {
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default)]
    pub formula: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectations {
    /// Expected formula fingerprint (lowercase 64-hex).
    #[serde(default)]
    pub formula_id: Option<String>,
}

/// Where the formula comes from once the manifest is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaSource {
    File(PathBuf),
    Preset(String),
}

/// Paths resolved against the manifest's directory.
#[derive(Debug, Clone)]
pub struct ResolvedManifest {
    pub dataset_path: PathBuf,
    pub formula: FormulaSource,
    pub digests: Option<InputDigests>,
    pub expect: Option<Expectations>,
}

#[derive(Debug)]
pub enum ManifestError {
    Empty(&'static str),
    UrlPath(&'static str, String),
    Io(&'static str, String),
    NotAFile(&'static str, String),
    /// Neither or both of `formula_path` / `preset`.
    FormulaSource,
    UnknownPreset(String),
    /// Bad hex format / shape (not a mismatch).
    DigestShape(&'static str, String),
    /// Provided digest doesn't match the canonical sha256 of the input.
    DigestMismatch(&'static str, String),
    ExpectationMismatch(&'static str, String),
    /// Digest provided for an input that is not a file.
    DigestForMissing(&'static str),
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ManifestError::*;
        match self {
            Empty(k) => write!(f, "field must not be empty: {k}"),
            UrlPath(k, v) => write!(f, "path must be offline (no scheme) for {k}: {v}"),
            Io(k, v) => write!(f, "cannot access {k}: {v}"),
            NotAFile(k, v) => write!(f, "path is not a file for {k}: {v}"),
            FormulaSource => f.write_str("exactly one of formula_path or preset is required"),
            UnknownPreset(p) => write!(f, "unknown preset: {p} (known: {})", presets::PRESET_NAMES.join(", ")),
            DigestShape(k, v) => write!(f, "invalid sha256 format for {k}: {v}"),
            DigestMismatch(k, v) => write!(f, "sha256 mismatch for {k}: {v}"),
            ExpectationMismatch(k, v) => write!(f, "expectation mismatch for {k}: {v}"),
            DigestForMissing(k) => write!(f, "digest supplied for missing input: {k}"),
        }
    }
}

impl std::error::Error for ManifestError {}

impl ManifestError {
    /// Digest and expectation failures are self-verification failures rather
    /// than malformed input.
    pub fn is_verification(&self) -> bool {
        matches!(self, ManifestError::DigestMismatch(..) | ManifestError::ExpectationMismatch(..))
    }
}

#[inline]
fn is_lower_hex_64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[inline]
fn join_under(base: &Path, rel: &str) -> PathBuf {
    let p = Path::new(rel);
    if p.is_absolute() { p.to_path_buf() } else { base.join(p) }
}

fn offline_check(label: &'static str, path: &str) -> Result<(), ManifestError> {
    if path.trim().is_empty() {
        return Err(ManifestError::Empty(label));
    }
    if looks_like_url_strict(path) {
        return Err(ManifestError::UrlPath(label, path.to_string()));
    }
    Ok(())
}

/// Validate manifest shape and offline path policy. Performs no I/O.
pub fn validate_manifest(man: &Manifest) -> Result<(), ManifestError> {
    offline_check("dataset_path", &man.dataset_path)?;

    match (&man.formula_path, &man.preset) {
        (Some(p), None) => offline_check("formula_path", p)?,
        (None, Some(name)) => {
            if presets::by_name(name).is_none() {
                return Err(ManifestError::UnknownPreset(name.clone()));
            }
        }
        _ => return Err(ManifestError::FormulaSource),
    }

    if let Some(d) = &man.inputs_sha256 {
        if let Some(h) = &d.dataset {
            if !is_lower_hex_64(h) {
                return Err(ManifestError::DigestShape("dataset", h.clone()));
            }
        }
        if let Some(h) = &d.formula {
            if man.formula_path.is_none() {
                return Err(ManifestError::DigestForMissing("formula"));
            }
            if !is_lower_hex_64(h) {
                return Err(ManifestError::DigestShape("formula", h.clone()));
            }
        }
    }

    if let Some(fid) = man.expect.as_ref().and_then(|e| e.formula_id.as_ref()) {
        if !is_lower_hex_64(fid) {
            return Err(ManifestError::DigestShape("expect.formula_id", fid.clone()));
        }
    }
    Ok(())
}

/// Resolve paths under `base_dir` and check that inputs exist and are files.
pub fn resolve_paths(base_dir: &Path, man: &Manifest) -> Result<ResolvedManifest, ManifestError> {
    let dataset_path = join_under(base_dir, &man.dataset_path);
    must_exist_file("dataset_path", &dataset_path)?;

    let formula = match (&man.formula_path, &man.preset) {
        (Some(p), _) => {
            let p = join_under(base_dir, p);
            must_exist_file("formula_path", &p)?;
            FormulaSource::File(p)
        }
        (None, Some(name)) => FormulaSource::Preset(name.clone()),
        (None, None) => return Err(ManifestError::FormulaSource),
    };

    Ok(ResolvedManifest {
        dataset_path,
        formula,
        digests: man.inputs_sha256.clone(),
        expect: man.expect.clone(),
    })
}

fn must_exist_file(label: &'static str, p: &Path) -> Result<(), ManifestError> {
    let md = fs::metadata(p).map_err(|e| ManifestError::Io(label, format!("{} ({e})", p.display())))?;
    if !md.is_file() {
        return Err(ManifestError::NotAFile(label, p.display().to_string()));
    }
    Ok(())
}

fn canonical_digest_of_file(label: &'static str, p: &Path) -> Result<String, ManifestError> {
    let bytes = fs::read(p).map_err(|e| ManifestError::Io(label, format!("{} ({e})", p.display())))?;
    let v: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| ManifestError::Io(label, format!("{} ({e})", p.display())))?;
    Ok(sha256_canonical_value(&v))
}

/// Verify provided digests over canonical JSON bytes. `Ok(())` when none were given.
pub fn verify_digests(resolved: &ResolvedManifest) -> Result<(), ManifestError> {
    let Some(d) = &resolved.digests else { return Ok(()) };

    let check = |label: &'static str, path: &Path, expect_hex: &str| -> Result<(), ManifestError> {
        let got = canonical_digest_of_file(label, path)?;
        if got != expect_hex {
            return Err(ManifestError::DigestMismatch(label, format!("expected={expect_hex} got={got}")));
        }
        Ok(())
    };

    if let Some(hex) = &d.dataset {
        check("dataset", &resolved.dataset_path, hex)?;
    }
    if let Some(hex) = &d.formula {
        match &resolved.formula {
            FormulaSource::File(p) => check("formula", p, hex)?,
            FormulaSource::Preset(_) => return Err(ManifestError::DigestForMissing("formula")),
        }
    }
    Ok(())
}

/// Enforce `expect.formula_id` if provided. Called once overrides are applied,
/// since they change the fingerprint.
pub fn enforce_expectations(expect: Option<&Expectations>, actual_formula_id: &str) -> Result<(), ManifestError> {
    if let Some(want) = expect.and_then(|e| e.formula_id.as_ref()) {
        if want != actual_formula_id {
            return Err(ManifestError::ExpectationMismatch(
                "formula_id",
                format!("expected={want} got={actual_formula_id}"),
            ));
        }
    }
    Ok(())
}

/// Read + parse + validate a manifest file.
pub fn load_manifest(path: &Path) -> Result<Manifest, IoError> {
    let bytes = fs::read(path)?;
    let man: Manifest = serde_json::from_slice(&bytes)?;
    validate_manifest(&man)?;
    Ok(man)
}

/// Load, validate, resolve relative to the manifest's directory and verify digests.
pub fn load_and_resolve(path: &Path) -> Result<ResolvedManifest, IoError> {
    let man = load_manifest(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let resolved = resolve_paths(base, &man)?;
    verify_digests(&resolved)?;
    Ok(resolved)
}
