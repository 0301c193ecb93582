//! Indicator tables and weight vectors.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::tokens::{EntityId, IndicatorId};

/// One row of the dataset: an entity and its raw indicator values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityRow {
    pub entity: EntityId,
    pub values: BTreeMap<IndicatorId, f64>,
}

impl EntityRow {
    pub fn value(&self, indicator: &str) -> Option<f64> {
        self.values.get(indicator).copied()
    }
}

/// The raw dataset: one row per entity. Row order is the dataset order and
/// is preserved through every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndicatorTable {
    pub entities: Vec<EntityRow>,
}

impl IndicatorTable {
    /// Build a table, rejecting empty input and duplicate entity ids.
    pub fn new(entities: Vec<EntityRow>) -> Result<Self, CoreError> {
        let t = Self { entities };
        t.check()?;
        Ok(t)
    }

    pub fn check(&self) -> Result<(), CoreError> {
        if self.entities.is_empty() {
            return Err(CoreError::EmptyTable);
        }
        let mut seen = BTreeSet::new();
        for row in &self.entities {
            if !seen.insert(row.entity.as_str()) {
                return Err(CoreError::DuplicateEntity(row.entity.to_string()));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize { self.entities.len() }

    pub fn is_empty(&self) -> bool { self.entities.is_empty() }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|r| r.entity.clone()).collect()
    }

    /// True when at least one row carries the indicator.
    pub fn has_column(&self, indicator: &str) -> bool {
        self.entities.iter().any(|r| r.values.contains_key(indicator))
    }

    /// Entities lacking a value for `indicator`, in dataset order.
    pub fn missing_in(&self, indicator: &str) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|r| !r.values.contains_key(indicator))
            .map(|r| r.entity.clone())
            .collect()
    }

    /// Full column in dataset order; `None` if any row lacks the value.
    pub fn column(&self, indicator: &str) -> Option<Vec<f64>> {
        self.entities.iter().map(|r| r.value(indicator)).collect()
    }
}

/// Indicator name → non-negative weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightVector(BTreeMap<IndicatorId, f64>);

impl WeightVector {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, id: IndicatorId, weight: f64) -> Option<f64> {
        self.0.insert(id, weight)
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.0.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IndicatorId, f64)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    /// Keep only the indicators accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&IndicatorId) -> bool) {
        self.0.retain(|k, _| keep(k));
    }

    /// Rescale so the weights sum to exactly 1 (up to rounding).
    /// Fails on negative/non-finite entries or a zero sum.
    pub fn normalized(&self) -> Result<WeightVector, CoreError> {
        if self.0.values().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(CoreError::DomainOutOfRange("weight"));
        }
        let sum = self.sum();
        if sum <= 0.0 {
            return Err(CoreError::DomainOutOfRange("weights (sum must be > 0)"));
        }
        Ok(self.0.iter().map(|(k, w)| (k.clone(), w / sum)).collect())
    }
}

impl FromIterator<(IndicatorId, f64)> for WeightVector {
    fn from_iter<I: IntoIterator<Item = (IndicatorId, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ind(s: &str) -> IndicatorId { IndicatorId::new(s).unwrap() }

    fn row(e: &str, vals: &[(&str, f64)]) -> EntityRow {
        EntityRow {
            entity: EntityId::new(e).unwrap(),
            values: vals.iter().map(|(k, v)| (ind(k), *v)).collect(),
        }
    }

    #[test]
    fn duplicate_entities_rejected() {
        let err = IndicatorTable::new(vec![row("A", &[]), row("A", &[])]).unwrap_err();
        assert_eq!(err, CoreError::DuplicateEntity("A".into()));
        assert_eq!(IndicatorTable::new(vec![]).unwrap_err(), CoreError::EmptyTable);
    }

    #[test]
    fn column_requires_every_row() {
        let t = IndicatorTable::new(vec![
            row("A", &[("x", 1.0), ("y", 2.0)]),
            row("B", &[("x", 3.0)]),
        ])
        .unwrap();
        assert_eq!(t.column("x"), Some(vec![1.0, 3.0]));
        assert_eq!(t.column("y"), None);
        assert!(t.has_column("y"));
        assert_eq!(t.missing_in("y"), vec![EntityId::new("B").unwrap()]);
        assert!(!t.has_column("z"));
    }

    #[test]
    fn weights_normalize_to_one() {
        let w: WeightVector = [(ind("a"), 0.2), (ind("b"), 0.6)].into_iter().collect();
        let n = w.normalized().unwrap();
        assert!((n.sum() - 1.0).abs() < 1e-12);
        assert!((n.get("a").unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn zero_weight_sum_is_an_error() {
        let w: WeightVector = [(ind("a"), 0.0)].into_iter().collect();
        assert!(w.normalized().is_err());
    }
}
