//! fondo_report/src/lib.rs: offline report model and JSON renderer.
//!
//! - No I/O here. Callers pass artifacts already in memory.
//! - Artifacts are taken as `serde_json::Value`, so this crate does not depend
//!   on the pipeline's concrete types; it reads well-known fields only.
//! - Stable section order and field names.

#![deny(unsafe_code)]

use core::fmt;

pub mod format;
pub mod structure;
#[cfg(feature = "render_json")]
pub mod render_json;

pub use fondo_core::ids::{ResultId, RunId};
pub use structure::{build_model, ReportModel};
#[cfg(feature = "render_json")]
pub use render_json::{render_json, render_value};

/// Parsed `result.json`.
pub type ResultArtifact = serde_json::Value;
/// Parsed `run_record.json`.
pub type RunRecordArtifact = serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    Template(&'static str),
    MissingField(&'static str),
    Inconsistent(&'static str),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Template(s) => write!(f, "render failed: {s}"),
            ReportError::MissingField(s) => write!(f, "missing field: {s}"),
            ReportError::Inconsistent(s) => write!(f, "inconsistent artifacts: {s}"),
        }
    }
}

impl std::error::Error for ReportError {}
