//! Formula variables: direction, redistribution mode, band policy and the
//! `FormulaSpec` configuration object with domain validation.
//!
//! A `FormulaSpec` is the single parameterized description of an allocation
//! formula (indicator list + direction map + weight map + epsilon + bands).
//! Each pipeline run takes one immutable snapshot of it.

use core::str::FromStr;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entities::WeightVector;
use crate::errors::CoreError;
use crate::tokens::IndicatorId;

/// Define a serde'd enum with explicit wire tokens. Reading goes through the
/// type's `FromStr`, so a bad token surfaces as a `CoreError`.
macro_rules! serde_enum {
    ($name:ident => { $($variant:ident = $token:expr),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String")]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $token, )+
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;
            fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
        }
    };
}

serde_enum!(Direction => {
    Positive = "positive",
    Negative = "negative"
});

serde_enum!(RedistributionMode => {
    SinglePass = "single_pass",
    WaterFill  = "water_fill"
});

impl FromStr for Direction {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Direction::Positive),
            "negative" => Ok(Direction::Negative),
            other => Err(CoreError::InvalidDirection(other.to_string())),
        }
    }
}

impl FromStr for RedistributionMode {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_pass" | "single-pass" => Ok(RedistributionMode::SinglePass),
            "water_fill" | "water-fill" => Ok(RedistributionMode::WaterFill),
            _ => Err(CoreError::DomainOutOfRange("redistribution")),
        }
    }
}

impl Default for RedistributionMode {
    fn default() -> Self { RedistributionMode::SinglePass }
}

/// Upper bound (exclusive) accepted for the epsilon shift constant.
pub const EPSILON_MAX: f64 = 0.5;

/// One indicator of a formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndicatorSpec {
    pub id: IndicatorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub direction: Direction,
    pub weight: f64,
}

/// Prior-year corridor. `prior_column` names the dataset column holding
/// the previous allocation for each entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BandSpec {
    pub prior_column: IndicatorId,
    pub lower_pct: f64,
    pub upper_pct: f64,
}

fn default_true() -> bool { true }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormulaSpec {
    pub name: String,
    pub indicators: Vec<IndicatorSpec>,
    pub epsilon: f64,
    pub budget: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bands: Option<BandSpec>,
    #[serde(default)]
    pub redistribution: RedistributionMode,
    /// When true, every formula indicator must be present in the dataset.
    #[serde(default = "default_true")]
    pub strict_indicators: bool,
}

impl FormulaSpec {
    /// Raw weight map as configured (not renormalized).
    pub fn weights(&self) -> WeightVector {
        self.indicators
            .iter()
            .map(|i| (i.id.clone(), i.weight))
            .collect()
    }

    pub fn indicator(&self, id: &str) -> Option<&IndicatorSpec> {
        self.indicators.iter().find(|i| i.id.as_str() == id)
    }

    pub fn direction_of(&self, id: &str) -> Option<Direction> {
        self.indicator(id).map(|i| i.direction)
    }

    /// Override one indicator's weight (the slider of the dashboards).
    pub fn set_weight(&mut self, id: &str, weight: f64) -> Result<(), CoreError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(CoreError::DomainOutOfRange("weight"));
        }
        let spec = self
            .indicators
            .iter_mut()
            .find(|i| i.id.as_str() == id)
            .ok_or_else(|| CoreError::UnknownIndicator(id.to_string()))?;
        spec.weight = weight;
        Ok(())
    }
}

/// Domain checks applied before any computation.
pub fn validate_domains(f: &FormulaSpec) -> Result<(), CoreError> {
    if f.indicators.is_empty() {
        return Err(CoreError::EmptyFormula);
    }
    let mut seen = BTreeSet::new();
    for ind in &f.indicators {
        if !seen.insert(ind.id.as_str()) {
            return Err(CoreError::DuplicateIndicator(ind.id.to_string()));
        }
        if !ind.weight.is_finite() || ind.weight < 0.0 {
            return Err(CoreError::DomainOutOfRange("weight"));
        }
    }
    if f.weights().sum() <= 0.0 {
        return Err(CoreError::DomainOutOfRange("weights (sum must be > 0)"));
    }
    if !(f.epsilon > 0.0 && f.epsilon < EPSILON_MAX) {
        return Err(CoreError::DomainOutOfRange("epsilon (0 < e < 0.5)"));
    }
    if !(f.budget.is_finite() && f.budget > 0.0) {
        return Err(CoreError::DomainOutOfRange("budget (> 0)"));
    }
    if let Some(b) = &f.bands {
        if !(b.lower_pct.is_finite() && (0.0..=1.0).contains(&b.lower_pct)) {
            return Err(CoreError::DomainOutOfRange("bands.lower_pct (0..=1)"));
        }
        if !(b.upper_pct.is_finite() && b.upper_pct >= 0.0) {
            return Err(CoreError::DomainOutOfRange("bands.upper_pct (>= 0)"));
        }
        if seen.contains(b.prior_column.as_str()) {
            return Err(CoreError::DuplicateIndicator(b.prior_column.to_string()));
        }
    }
    Ok(())
}
