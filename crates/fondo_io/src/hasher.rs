//! crates/fondo_io/src/hasher.rs
//!
//! Deterministic hashing and ID builders for canonical artifacts.
//!
//! - Canonical JSON hashing: UTF-8, sorted object keys, array order preserved.
//! - `RES:<hex>` for result.json, `RUN:<ts>:<hex>` for run_record.json and the
//!   bare 64-hex formula fingerprint all derive from canonical bytes.
//! - Hex digests are lowercase.
//!
//! Use `sha256_canonical(..)` for JSON values/structs and `sha256_hex(..)` for
//! raw bytes.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use fondo_core::ids::{is_ts_utc_z, FormulaId, ResultId, RunId};
use fondo_core::FormulaSpec;

use crate::canonical_json::to_canonical_json_bytes;

#[derive(Error, Debug)]
pub enum HashError {
    #[error("JSON serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid timestamp (expected RFC3339 UTC like 2025-08-12T10:00:00Z): {0}")]
    InvalidTimestamp(String),

    #[error("malformed id: {0}")]
    InvalidId(String),
}

/* ------------------------------- Raw hashing ------------------------------- */

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/* ---------------------------- Canonical hashing ---------------------------- */

pub fn sha256_canonical_value(v: &Value) -> String {
    sha256_hex(&to_canonical_json_bytes(v))
}

/// SHA-256 over the canonical JSON bytes of any serializable value.
pub fn sha256_canonical<T: Serialize>(value: &T) -> Result<String, HashError> {
    let v = serde_json::to_value(value)?;
    Ok(sha256_canonical_value(&v))
}

/* ---------------------------- Artifact ID builders ---------------------------- */

/// Fingerprint of a formula snapshot (indicators, directions, weights,
/// epsilon, budget, bands, redistribution mode).
pub fn formula_id(formula: &FormulaSpec) -> Result<FormulaId, HashError> {
    let hex = sha256_canonical(formula)?;
    hex.parse().map_err(|_| HashError::InvalidId(hex))
}

/// `RES:<hex>` for `result.json`.
pub fn res_id_from_canonical<T: Serialize>(value: &T) -> Result<ResultId, HashError> {
    let id = format!("RES:{}", sha256_canonical(value)?);
    id.parse().map_err(|_| HashError::InvalidId(id))
}

/// `RUN:<timestamp>:<hex>` for `run_record.json`.
/// `timestamp_utc` must be RFC3339 UTC; it is normalized to seconds + `Z`.
pub fn run_id_from_bytes(timestamp_utc: &str, run_bytes_canonical: &[u8]) -> Result<RunId, HashError> {
    let ts = normalize_rfc3339_utc_seconds(timestamp_utc)?;
    let id = format!("RUN:{ts}:{}", sha256_hex(run_bytes_canonical));
    id.parse().map_err(|_| HashError::InvalidId(id))
}

pub fn run_id_from_canonical<T: Serialize>(timestamp_utc: &str, run_value: &T) -> Result<RunId, HashError> {
    let v = serde_json::to_value(run_value)?;
    run_id_from_bytes(timestamp_utc, &to_canonical_json_bytes(&v))
}

/* --------------------------------- Timestamps --------------------------------- */

/// Normalize to `YYYY-MM-DDTHH:MM:SSZ`. Accepts an optional fractional part
/// and a `Z`, `+00:00` or `-00:00` suffix.
pub fn normalize_rfc3339_utc_seconds(ts: &str) -> Result<String, HashError> {
    let bad = || HashError::InvalidTimestamp(ts.to_string());

    let head = ts.get(..19).ok_or_else(bad)?;
    let mut rest = &ts[19..];
    if let Some(frac) = rest.strip_prefix('.') {
        let digits = frac.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 || digits > 9 {
            return Err(bad());
        }
        rest = &frac[digits..];
    }
    if !matches!(rest, "Z" | "+00:00" | "-00:00") {
        return Err(bad());
    }

    let out = format!("{head}Z");
    if !is_ts_utc_z(&out) {
        return Err(bad());
    }
    let field = |r: core::ops::Range<usize>| out[r].parse::<u32>().map_err(|_| bad());
    let (mo, d, hh, mm, ss) = (field(5..7)?, field(8..10)?, field(11..13)?, field(14..16)?, field(17..19)?);
    if !(1..=12).contains(&mo) || !(1..=31).contains(&d) || hh > 23 || mm > 59 || ss > 59 {
        return Err(bad());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_encoding_is_lowercase() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn canonical_hashing_ignores_key_order() {
        #[derive(Serialize)]
        struct T {
            b: u32,
            a: u32,
        }
        let h1 = sha256_canonical(&T { b: 2, a: 1 }).unwrap();
        let h2 = sha256_canonical_value(&json!({"a": 1, "b": 2}));
        assert_eq!(h1, h2);
    }

    #[test]
    fn run_id_normalizes_timestamp() {
        let id1 = run_id_from_bytes("2025-08-12T10:00:00Z", b"payload").unwrap();
        let id2 = run_id_from_bytes("2025-08-12T10:00:00.123Z", b"payload").unwrap();
        let id3 = run_id_from_bytes("2025-08-12T10:00:00+00:00", b"payload").unwrap();
        assert_eq!(id1, id2);
        assert_eq!(id1, id3);
        assert!(id1.as_str().starts_with("RUN:2025-08-12T10:00:00Z:"));
    }

    #[test]
    fn rejects_non_utc_and_out_of_range() {
        assert!(normalize_rfc3339_utc_seconds("2025-08-12T10:00:00+02:00").is_err());
        assert!(normalize_rfc3339_utc_seconds("2025-13-12T10:00:00Z").is_err());
        assert!(normalize_rfc3339_utc_seconds("2025-08-12").is_err());
    }

    #[test]
    fn formula_id_tracks_weights() {
        let mut f = fondo_core::presets::demo();
        let a = formula_id(&f).unwrap();
        assert_eq!(a, formula_id(&fondo_core::presets::demo()).unwrap());
        f.set_weight("Gasto por Hab", 0.5).unwrap();
        assert_ne!(a, formula_id(&f).unwrap());
    }
}
