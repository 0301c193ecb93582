//! Proportional allocation constrained to a corridor around the prior-year
//! allocation, followed by redistribution of the signed remainder.
//!
//! Steps:
//! 1) `share = s / Σs`, `allocation = share × budget`,
//!    `variation = allocation / prior − 1`.
//! 2) `band_min = prior × (1 − lower)`, `band_max = prior × (1 + upper)`,
//!    `surplus = max(0, allocation − band_max)`,
//!    `deficit = max(0, band_min − allocation)`,
//!    `remainder = Σ surplus − Σ deficit`.
//! 3) `clamped = clip(allocation, band_min, band_max)`,
//!    `eligible = clamped < band_max`; the remainder is then placed either in
//!    one equal split among eligible entities (`SinglePass`) or iteratively
//!    within the bands (`WaterFill`).
//!
//! A zero prior is rejected with `DivisionUndefined` rather than producing
//! an infinite variation.

use fondo_core::RedistributionMode;

use super::proportional::proportional;
use super::water_fill::water_fill;
use crate::{check_len, AlgoError};

/// Relative tolerance (× budget) under which a remainder counts as placed.
pub const REMAINDER_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub lower_pct: f64,
    pub upper_pct: f64,
}

impl Bands {
    pub fn new(lower_pct: f64, upper_pct: f64) -> Result<Self, AlgoError> {
        if !(lower_pct.is_finite() && (0.0..=1.0).contains(&lower_pct)) {
            return Err(AlgoError::InvalidArgument("lower band must be in [0, 1]"));
        }
        if !(upper_pct.is_finite() && upper_pct >= 0.0) {
            return Err(AlgoError::InvalidArgument("upper band must be >= 0"));
        }
        Ok(Self { lower_pct, upper_pct })
    }

    #[inline]
    pub fn bounds(&self, prior: f64) -> (f64, f64) {
        (prior * (1.0 - self.lower_pct), prior * (1.0 + self.upper_pct))
    }
}

/// One entity's row of the allocation table.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRow {
    pub share: f64,
    pub allocation: f64,
    pub prior: f64,
    pub variation: f64,
    pub band_min: f64,
    pub band_max: f64,
    pub surplus: f64,
    pub deficit: f64,
    pub clamped: f64,
    pub eligible: bool,
    pub remainder_share: f64,
    pub final_allocation: f64,
    pub final_variation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandedAllocation {
    pub rows: Vec<AllocationRow>,
    pub surplus_total: f64,
    pub deficit_total: f64,
    /// `surplus_total − deficit_total`.
    pub remainder: f64,
    pub eligible_count: usize,
    pub final_total: f64,
    /// Part of the remainder no entity received.
    pub undistributed: f64,
    pub passes: u32,
    pub mode: RedistributionMode,
}

/// Single-pass allocation with a ±band corridor.
pub fn allocate(
    shifted: &[f64],
    budget: f64,
    prior: &[f64],
    lower_pct: f64,
    upper_pct: f64,
) -> Result<BandedAllocation, AlgoError> {
    let bands = Bands::new(lower_pct, upper_pct)?;
    allocate_with_mode(shifted, budget, prior, bands, RedistributionMode::SinglePass)
}

pub fn allocate_with_mode(
    shifted: &[f64],
    budget: f64,
    prior: &[f64],
    bands: Bands,
    mode: RedistributionMode,
) -> Result<BandedAllocation, AlgoError> {
    check_len(shifted.len(), prior.len())?;
    for (index, &p) in prior.iter().enumerate() {
        if !p.is_finite() || p < 0.0 {
            return Err(AlgoError::InvalidArgument("prior allocation must be finite and > 0"));
        }
        if p == 0.0 {
            return Err(AlgoError::DivisionUndefined { index });
        }
    }

    // Step 1
    let prop = proportional(shifted, budget)?;

    // Step 2 + clamp
    let mut rows: Vec<AllocationRow> = prop
        .shares
        .iter()
        .zip(&prop.allocations)
        .zip(prior)
        .map(|((&share, &allocation), &prior)| {
            let (band_min, band_max) = bands.bounds(prior);
            let clamped = allocation.max(band_min).min(band_max);
            AllocationRow {
                share,
                allocation,
                prior,
                variation: allocation / prior - 1.0,
                band_min,
                band_max,
                surplus: (allocation - band_max).max(0.0),
                deficit: (band_min - allocation).max(0.0),
                clamped,
                eligible: clamped < band_max,
                remainder_share: 0.0,
                final_allocation: clamped,
                final_variation: 0.0,
            }
        })
        .collect();

    let surplus_total: f64 = rows.iter().map(|r| r.surplus).sum();
    let deficit_total: f64 = rows.iter().map(|r| r.deficit).sum();
    let remainder = surplus_total - deficit_total;
    let eligible_count = rows.iter().filter(|r| r.eligible).count();

    // Step 3
    let (undistributed, passes) = match mode {
        RedistributionMode::SinglePass => {
            if eligible_count == 0 {
                (remainder, 1)
            } else {
                let each = remainder / eligible_count as f64;
                for r in rows.iter_mut().filter(|r| r.eligible) {
                    r.remainder_share = each;
                    r.final_allocation = r.clamped + each;
                }
                (0.0, 1)
            }
        }
        RedistributionMode::WaterFill => {
            let start: Vec<f64> = rows.iter().map(|r| r.clamped).collect();
            let floor: Vec<f64> = rows.iter().map(|r| r.band_min).collect();
            let ceiling: Vec<f64> = rows.iter().map(|r| r.band_max).collect();
            let wf = water_fill(&start, &floor, &ceiling, remainder, budget * REMAINDER_TOLERANCE);
            for (r, f) in rows.iter_mut().zip(wf.finals) {
                r.remainder_share = f - r.clamped;
                r.final_allocation = f;
            }
            (wf.undistributed, wf.passes)
        }
    };

    for r in &mut rows {
        r.final_variation = (r.final_allocation - r.prior) / r.prior;
    }
    let final_total = rows.iter().map(|r| r.final_allocation).sum();

    Ok(BandedAllocation {
        rows,
        surplus_total,
        deficit_total,
        remainder,
        eligible_count,
        final_total,
        undistributed,
        passes,
        mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-6)
    }

    fn col(a: &BandedAllocation, f: impl Fn(&AllocationRow) -> f64) -> Vec<f64> {
        a.rows.iter().map(f).collect()
    }

    #[test]
    fn three_entity_reference_case() {
        let a = allocate(&[0.5, 0.3, 0.2], 300.0, &[100.0; 3], 0.1, 0.1).unwrap();

        assert!(close(&col(&a, |r| r.allocation), &[150.0, 90.0, 60.0]));
        assert!(close(&col(&a, |r| r.surplus), &[40.0, 0.0, 0.0]));
        assert!(close(&col(&a, |r| r.deficit), &[0.0, 0.0, 30.0]));
        assert!((a.remainder - 10.0).abs() < 1e-6);
        assert!(close(&col(&a, |r| r.clamped), &[110.0, 90.0, 90.0]));
        assert_eq!(
            a.rows.iter().map(|r| r.eligible).collect::<Vec<_>>(),
            vec![false, true, true]
        );
        assert_eq!(a.eligible_count, 2);
        assert!(close(&col(&a, |r| r.remainder_share), &[0.0, 5.0, 5.0]));
        assert!(close(&col(&a, |r| r.final_allocation), &[110.0, 95.0, 95.0]));
        assert!(close(&col(&a, |r| r.final_variation), &[0.1, -0.05, -0.05]));
        assert!((a.final_total - 300.0).abs() < 1e-6);
        assert_eq!(a.undistributed, 0.0);
    }

    #[test]
    fn zero_prior_is_division_undefined() {
        assert_eq!(
            allocate(&[0.5, 0.5], 10.0, &[5.0, 0.0], 0.1, 0.1),
            Err(AlgoError::DivisionUndefined { index: 1 })
        );
        assert!(matches!(
            allocate(&[0.5, 0.5], 10.0, &[5.0, -1.0], 0.1, 0.1),
            Err(AlgoError::InvalidArgument(_))
        ));
    }

    #[test]
    fn non_positive_budget_fails() {
        assert!(matches!(
            allocate(&[0.5], 0.0, &[1.0], 0.1, 0.1),
            Err(AlgoError::InvalidArgument(_))
        ));
    }

    #[test]
    fn no_eligible_entity_leaves_remainder_undistributed() {
        // Budget far above every ceiling: all clamp to band_max.
        let a = allocate(&[0.5, 0.5], 1000.0, &[100.0, 100.0], 0.1, 0.1).unwrap();
        assert_eq!(a.eligible_count, 0);
        assert!(close(&col(&a, |r| r.final_allocation), &[110.0, 110.0]));
        assert!((a.undistributed - 780.0).abs() < 1e-6);
    }

    #[test]
    fn single_pass_can_overshoot_water_fill_cannot() {
        let shifted = [0.5, 0.35, 0.15];
        let prior = [100.0; 3];
        let bands = Bands::new(0.5, 0.1).unwrap();

        let sp = allocate_with_mode(&shifted, 300.0, &prior, bands, RedistributionMode::SinglePass).unwrap();
        assert!(close(&col(&sp, |r| r.final_allocation), &[110.0, 122.5, 67.5]));

        let wf = allocate_with_mode(&shifted, 300.0, &prior, bands, RedistributionMode::WaterFill).unwrap();
        assert!(close(&col(&wf, |r| r.final_allocation), &[110.0, 110.0, 80.0]));
        assert_eq!(wf.passes, 2);
        assert!((wf.final_total - 300.0).abs() < 1e-6);
        for r in &wf.rows {
            assert!(r.final_allocation <= r.band_max + 1e-9);
            assert!(r.final_allocation >= r.band_min - 1e-9);
        }
    }

    #[test]
    fn bands_domain() {
        assert!(Bands::new(1.1, 0.1).is_err());
        assert!(Bands::new(0.1, -0.1).is_err());
        assert!(Bands::new(0.0, 0.0).is_ok());
    }
}
