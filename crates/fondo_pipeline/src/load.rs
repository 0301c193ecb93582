//! LOAD stage: layer caller overrides over the loaded formula.
//!
//! Precedence, lowest first: preset or formula file, then these overrides.
//! The result is the immutable formula snapshot for the rest of the run.

use std::collections::BTreeMap;

use serde::Serialize;

use fondo_core::{FormulaSpec, RedistributionMode};

use crate::PipelineError;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epsilon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_band: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_band: Option<f64>,
    /// Indicator id → weight (the dashboards' sliders).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub weights: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redistribution: Option<RedistributionMode>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        *self == Overrides::default()
    }
}

pub fn apply_overrides(base: &FormulaSpec, o: &Overrides) -> Result<FormulaSpec, PipelineError> {
    let mut f = base.clone();

    if let Some(b) = o.budget {
        f.budget = b;
    }
    if let Some(e) = o.epsilon {
        f.epsilon = e;
    }
    if o.lower_band.is_some() || o.upper_band.is_some() {
        let bands = f.bands.as_mut().ok_or_else(|| {
            PipelineError::Validate(format!(
                "band override given but formula '{}' has no bands",
                f.name
            ))
        })?;
        if let Some(l) = o.lower_band {
            bands.lower_pct = l;
        }
        if let Some(u) = o.upper_band {
            bands.upper_pct = u;
        }
    }
    for (id, w) in &o.weights {
        f.set_weight(id, *w)
            .map_err(|e| PipelineError::Validate(format!("weight override {id}: {e}")))?;
    }
    if let Some(m) = o.redistribution {
        f.redistribution = m;
    }
    Ok(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fondo_core::presets;

    #[test]
    fn overrides_layer_over_preset() {
        let mut o = Overrides { budget: Some(1000.0), upper_band: Some(0.2), ..Default::default() };
        o.weights.insert("Pob".into(), 0.5);
        o.redistribution = Some(RedistributionMode::WaterFill);

        let f = apply_overrides(&presets::fasp(), &o).unwrap();
        assert_eq!(f.budget, 1000.0);
        assert_eq!(f.indicator("Pob").unwrap().weight, 0.5);
        let b = f.bands.unwrap();
        assert_eq!((b.lower_pct, b.upper_pct), (0.1, 0.2));
        assert_eq!(f.redistribution, RedistributionMode::WaterFill);
    }

    #[test]
    fn band_override_needs_bands() {
        let o = Overrides { lower_band: Some(0.1), ..Default::default() };
        assert!(matches!(apply_overrides(&presets::fofisp(), &o), Err(PipelineError::Validate(_))));
    }

    #[test]
    fn unknown_weight_id_rejected() {
        let mut o = Overrides::default();
        o.weights.insert("Nope".into(), 0.1);
        assert!(apply_overrides(&presets::demo(), &o).is_err());
        assert!(Overrides::default().is_empty());
    }
}
