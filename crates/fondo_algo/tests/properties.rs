use fondo_algo::allocation::{allocate_with_mode, Bands};
use fondo_algo::{normalize, normalize_column, proportional, shift, shift_value};
use fondo_core::{Direction, RedistributionMode};
use proptest::prelude::*;

fn arb_column() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e6f64..1.0e6, 1..30)
}

fn arb_mode() -> impl Strategy<Value = RedistributionMode> {
    prop_oneof![Just(RedistributionMode::SinglePass), Just(RedistributionMode::WaterFill)]
}

/// (shifted index, prior allocations) of equal length.
fn arb_entities() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (1usize..20).prop_flat_map(|n| {
        (
            prop::collection::vec(0.01f64..1.0, n),
            prop::collection::vec(1.0f64..1.0e6, n),
        )
    })
}

// ── Normalizer ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn normalized_values_stay_in_unit_interval(xs in arb_column()) {
        for d in [Direction::Positive, Direction::Negative] {
            for v in normalize(&xs, d).unwrap() {
                prop_assert!((0.0..=1.0).contains(&v), "{v}");
            }
        }
    }

    #[test]
    fn endpoints_map_to_zero_and_one(xs in arb_column()) {
        let c = normalize_column(&xs, Direction::Positive).unwrap();
        prop_assume!(!c.degenerate);
        let imin = xs.iter().position(|&v| v == c.min).unwrap();
        let imax = xs.iter().position(|&v| v == c.max).unwrap();
        prop_assert_eq!(c.values[imin], 0.0);
        prop_assert_eq!(c.values[imax], 1.0);

        let neg = normalize(&xs, Direction::Negative).unwrap();
        prop_assert_eq!(neg[imin], 1.0);
        prop_assert_eq!(neg[imax], 0.0);
    }

    #[test]
    fn negative_is_complement_of_positive(xs in arb_column()) {
        let pos = normalize(&xs, Direction::Positive).unwrap();
        let neg = normalize(&xs, Direction::Negative).unwrap();
        for (p, n) in pos.iter().zip(&neg) {
            prop_assert!((n - (1.0 - p)).abs() < 1e-6, "pos={p} neg={n}");
        }
    }

    #[test]
    fn constant_column_maps_to_half(v in -1.0e6f64..1.0e6, n in 1usize..30) {
        let xs = vec![v; n];
        prop_assert_eq!(normalize(&xs, Direction::Positive).unwrap(), vec![0.5; n]);
        prop_assert_eq!(normalize(&xs, Direction::Negative).unwrap(), vec![0.5; n]);
    }
}

// ── Shifter ──────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn shift_fixes_endpoints(eps in 0.0001f64..0.4999) {
        prop_assert_eq!(shift_value(0.0, eps), eps);
        prop_assert!((shift_value(1.0, eps) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn shift_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0, eps in 0.0001f64..0.4999) {
        let out = shift(&[a, b], eps).unwrap();
        if a < b {
            prop_assert!(out[0] <= out[1]);
        } else if a > b {
            prop_assert!(out[0] >= out[1]);
        }
        for v in out {
            prop_assert!(v >= eps && v <= 1.0 + 1e-12);
        }
    }
}

// ── Allocator ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn proportional_allocation_sums_to_budget(
        (shifted, _prior) in arb_entities(),
        budget in 1.0f64..1.0e10,
    ) {
        let p = proportional(&shifted, budget).unwrap();
        let total: f64 = p.allocations.iter().sum();
        prop_assert!((total - budget).abs() <= 1e-6 * budget);
    }

    #[test]
    fn final_allocation_accounts_for_budget(
        (shifted, prior) in arb_entities(),
        budget in 1.0f64..1.0e7,
        lower in 0.0f64..=1.0,
        upper in 0.0f64..1.0,
        mode in arb_mode(),
    ) {
        let bands = Bands::new(lower, upper).unwrap();
        let a = allocate_with_mode(&shifted, budget, &prior, bands, mode).unwrap();

        let alloc_total: f64 = a.rows.iter().map(|r| r.allocation).sum();
        prop_assert!((alloc_total - budget).abs() <= 1e-6 * budget);

        let scale = budget.max(prior.iter().sum());
        prop_assert!(
            (a.final_total + a.undistributed - budget).abs() <= 1e-6 * scale,
            "final={} undistributed={} budget={}", a.final_total, a.undistributed, budget
        );
        if a.eligible_count > 0 && mode == RedistributionMode::SinglePass {
            prop_assert!((a.final_total - budget).abs() <= 1e-6 * scale);
        }
    }

    #[test]
    fn ineligible_entities_stay_in_band(
        (shifted, prior) in arb_entities(),
        budget in 1.0f64..1.0e7,
        lower in 0.0f64..=1.0,
        upper in 0.0f64..1.0,
        mode in arb_mode(),
    ) {
        let bands = Bands::new(lower, upper).unwrap();
        let a = allocate_with_mode(&shifted, budget, &prior, bands, mode).unwrap();
        for r in a.rows.iter().filter(|r| !r.eligible) {
            prop_assert!(r.final_allocation >= r.band_min && r.final_allocation <= r.band_max);
            if mode == RedistributionMode::SinglePass {
                prop_assert_eq!(r.remainder_share, 0.0);
            }
        }
    }

    #[test]
    fn water_fill_never_leaves_the_band(
        (shifted, prior) in arb_entities(),
        budget in 1.0f64..1.0e7,
        lower in 0.0f64..=1.0,
        upper in 0.0f64..1.0,
    ) {
        let bands = Bands::new(lower, upper).unwrap();
        let a = allocate_with_mode(&shifted, budget, &prior, bands, RedistributionMode::WaterFill).unwrap();
        prop_assert!(a.passes as usize <= shifted.len() + 1);
        for r in &a.rows {
            prop_assert!(r.final_allocation >= r.band_min && r.final_allocation <= r.band_max);
        }
    }
}
