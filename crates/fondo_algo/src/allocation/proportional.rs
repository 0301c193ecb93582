//! Proportional split of a budget by index: `share = s / Σs`,
//! `allocation = share × budget`.

use crate::AlgoError;

#[derive(Debug, Clone, PartialEq)]
pub struct Proportional {
    pub shares: Vec<f64>,
    pub allocations: Vec<f64>,
}

pub fn proportional(index: &[f64], budget: f64) -> Result<Proportional, AlgoError> {
    if index.is_empty() {
        return Err(AlgoError::Empty);
    }
    if !(budget.is_finite() && budget > 0.0) {
        return Err(AlgoError::InvalidArgument("budget must be > 0"));
    }
    if index.iter().any(|s| !s.is_finite() || *s < 0.0) {
        return Err(AlgoError::InvalidArgument("index values must be finite and >= 0"));
    }
    let total: f64 = index.iter().sum();
    if total <= 0.0 {
        return Err(AlgoError::InvalidArgument("index sum must be > 0"));
    }

    let shares: Vec<f64> = index.iter().map(|s| s / total).collect();
    let allocations = shares.iter().map(|sh| sh * budget).collect();
    Ok(Proportional { shares, allocations })
}
