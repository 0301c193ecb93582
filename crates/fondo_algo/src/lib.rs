// crates/fondo_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Numeric stages of the allocation engine. Every function here is pure:
//! slices in, fresh vectors out, no logging and no I/O.
//!
//! Order of application: `normalize` → `aggregate` → `shift` → `allocation`.

use core::fmt;

pub use fondo_core::{Direction, IndicatorId, RedistributionMode, WeightVector};

// ----------------------------- Errors --------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgoError {
    /// Argument outside the domain of the stage (non-finite value, non-positive
    /// budget, negative prior, epsilon outside [0, 1)).
    InvalidArgument(&'static str),
    /// Prior-year allocation of zero used as a divisor, at row `index`.
    DivisionUndefined { index: usize },
    /// Two parallel columns disagree on length.
    LengthMismatch { expected: usize, found: usize },
    /// No rows to operate on.
    Empty,
}

impl fmt::Display for AlgoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgoError::InvalidArgument(what) => write!(f, "invalid argument: {what}"),
            AlgoError::DivisionUndefined { index } => {
                write!(f, "division undefined: prior allocation is zero at row {index}")
            }
            AlgoError::LengthMismatch { expected, found } => {
                write!(f, "length mismatch: expected {expected} rows, found {found}")
            }
            AlgoError::Empty => f.write_str("no rows"),
        }
    }
}

impl std::error::Error for AlgoError {}

pub(crate) fn check_len(expected: usize, found: usize) -> Result<(), AlgoError> {
    if expected == found {
        Ok(())
    } else {
        Err(AlgoError::LengthMismatch { expected, found })
    }
}

// ----------------------------- Stages --------------------------------------------------

pub mod normalize;
pub mod aggregate;
pub mod shift;

pub mod allocation {
    pub mod proportional;
    pub mod banded;
    pub mod water_fill;

    pub use banded::{allocate, allocate_with_mode, AllocationRow, BandedAllocation, Bands};
    pub use proportional::{proportional, Proportional};
    pub use water_fill::water_fill;
}

pub use aggregate::{aggregate, CompositeIndex};
pub use allocation::{allocate, allocate_with_mode, proportional, AllocationRow, BandedAllocation, Bands, Proportional};
pub use normalize::{normalize, normalize_column, NormalizedColumn};
pub use shift::{shift, shift_value};
