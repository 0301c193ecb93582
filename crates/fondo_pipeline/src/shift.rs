//! SHIFT stage: epsilon-shift the composite so every index is strictly positive.

use tracing::debug;

use fondo_algo::shift;

use crate::PipelineError;

pub fn shift_index(scaled: &[f64], epsilon: f64) -> Result<Vec<f64>, PipelineError> {
    let out = shift(scaled, epsilon).map_err(|e| PipelineError::Shift(e.to_string()))?;
    debug!(epsilon, "shifted index");
    Ok(out)
}
