//! fondo_core: core types, formula domains, ordering helpers and presets.
//!
//! This crate is **I/O-free**. It defines stable types/APIs used across the
//! engine (`fondo_io`, `fondo_algo`, `fondo_pipeline`, `fondo_report`, `fondo_cli`).
//!
//! - Output IDs: `RES:`, `RUN:` and 64-hex formula fingerprints
//! - Registry tokens: `EntityId`, `IndicatorId`
//! - Formula domains: `Direction`, `RedistributionMode`, `FormulaSpec`
//! - Tables: `IndicatorTable`, `WeightVector`
//! - Deterministic ordering helpers (ranking by index)
//! - Built-in formula presets (FASP, FOFISP, demo)

#![forbid(unsafe_code)]

pub mod errors;
pub mod tokens;
pub mod ids;
pub mod variables;
pub mod entities;
pub mod determinism;
pub mod presets;

pub use errors::CoreError;
pub use tokens::{EntityId, IndicatorId};
pub use variables::{BandSpec, Direction, FormulaSpec, IndicatorSpec, RedistributionMode};
pub use entities::{EntityRow, IndicatorTable, WeightVector};
