//! Epsilon shift: `x × (1 − ε) + ε`, mapping [0, 1] onto [ε, 1] so no entity
//! ends with a zero index and a zero share.

use crate::AlgoError;

#[inline]
pub fn shift_value(x: f64, epsilon: f64) -> f64 {
    x * (1.0 - epsilon) + epsilon
}

pub fn shift(values: &[f64], epsilon: f64) -> Result<Vec<f64>, AlgoError> {
    if !(epsilon.is_finite() && (0.0..1.0).contains(&epsilon)) {
        return Err(AlgoError::InvalidArgument("epsilon must be in [0, 1)"));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(AlgoError::InvalidArgument("non-finite index value"));
    }
    Ok(values.iter().map(|&x| shift_value(x, epsilon)).collect())
}
