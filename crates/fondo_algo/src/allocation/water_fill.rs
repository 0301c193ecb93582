//! Iterative redistribution of a signed remainder inside per-entity bounds.
//!
//! Each pass splits what is left equally among the entities that can still
//! move in the remainder's direction (below their ceiling when positive,
//! above their floor when negative) and clamps them to their band. Every
//! pass either places the whole remainder or saturates at least one
//! recipient, so `n + 1` passes always suffice.

#[derive(Debug, Clone, PartialEq)]
pub struct WaterFill {
    pub finals: Vec<f64>,
    /// Amount that no entity could absorb (0 when fully placed).
    pub undistributed: f64,
    pub passes: u32,
}

/// `start`, `floor` and `ceiling` are parallel; `start` must lie inside the bounds.
pub fn water_fill(
    start: &[f64],
    floor: &[f64],
    ceiling: &[f64],
    remainder: f64,
    tolerance: f64,
) -> WaterFill {
    let n = start.len().min(floor.len()).min(ceiling.len());
    let mut current = start[..n].to_vec();
    let mut remaining = remainder;
    let mut passes = 0u32;

    while remaining.abs() > tolerance && (passes as usize) <= n {
        let recipients: Vec<usize> = (0..n)
            .filter(|&i| {
                if remaining > 0.0 {
                    current[i] < ceiling[i]
                } else {
                    current[i] > floor[i]
                }
            })
            .collect();
        if recipients.is_empty() {
            break;
        }

        let share = remaining / recipients.len() as f64;
        let mut placed = 0.0;
        for i in recipients {
            let next = (current[i] + share).max(floor[i]).min(ceiling[i]);
            placed += next - current[i];
            current[i] = next;
        }
        remaining -= placed;
        passes += 1;
    }

    WaterFill {
        finals: current,
        undistributed: if remaining.abs() <= tolerance { 0.0 } else { remaining },
        passes,
    }
}
