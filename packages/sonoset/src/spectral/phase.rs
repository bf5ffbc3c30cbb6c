//! Phase unwrapping and instantaneous frequency.
//!
//! Arrays are (time_steps, freq_bins); time advances along axis 0.

use std::f32::consts::PI;

use ndarray::Array2;

const TAU: f32 = 2.0 * PI;

/// Unwrap `phase` along the time axis: add/subtract multiples of 2π so
/// that consecutive differences per frequency bin lie in `[-π, π]`.
///
/// A jump of exactly +π is kept as +π (and −π as −π), matching the
/// reference unwrap convention at the boundary.
pub fn unwrap_phase(phase: &Array2<f32>) -> Array2<f32> {
    let (steps, bins) = phase.dim();
    let mut out = phase.clone();
    for b in 0..bins {
        let mut offset = 0.0f32;
        for t in 1..steps {
            let d = phase[[t, b]] - phase[[t - 1, b]];
            let wrapped = wrap_difference(d);
            offset += wrapped - d;
            out[[t, b]] = phase[[t, b]] + offset;
        }
    }
    out
}

/// Map a phase difference into `[-π, π]`, keeping the sign of exact ±π
/// jumps.
#[inline]
fn wrap_difference(d: f32) -> f32 {
    let wrapped = (d + PI).rem_euclid(TAU) - PI;
    if wrapped == -PI && d > 0.0 { PI } else { wrapped }
}

/// First time-difference of the unwrapped phase.
///
/// The first step uses an implicit zero-phase predecessor, i.e. it equals
/// the unwrapped phase itself. Consumers were trained on this convention;
/// it must not change.
pub fn instantaneous_frequency(phase: &Array2<f32>) -> Array2<f32> {
    let mut out = unwrap_phase(phase);
    let (steps, bins) = out.dim();
    for t in (1..steps).rev() {
        for b in 0..bins {
            out[[t, b]] -= out[[t - 1, b]];
        }
    }
    out
}

/* --------------------------------------------------------------------- */
/*  Unit-tests                                                           */

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    // deterministic pseudo-random angles in [-π, π]
    fn scrambled_phase(steps: usize, bins: usize) -> Array2<f32> {
        Array2::from_shape_fn((steps, bins), |(t, b)| {
            let x = ((t * 31 + b * 17 + 7) % 97) as f32 / 97.0;
            (x - 0.5) * 2.0 * PI
        })
    }

    #[test]
    fn unwrapped_differences_lie_within_pi() {
        let unwrapped = unwrap_phase(&scrambled_phase(40, 9));
        for b in 0..9 {
            for t in 1..40 {
                let d = unwrapped[[t, b]] - unwrapped[[t - 1, b]];
                assert!(d.abs() <= PI + 1e-4, "diff {d} out of range");
            }
        }
    }

    #[test]
    fn unwrap_is_identity_on_smooth_phase() {
        // slope well below π per step → nothing to correct
        let phase = Array2::from_shape_fn((30, 4), |(t, b)| 0.05 * t as f32 + 0.01 * b as f32);
        assert_eq!(unwrap_phase(&phase), phase);
    }

    #[test]
    fn cumulative_sum_recovers_unwrapped_phase() {
        let phase = scrambled_phase(25, 6);
        let unwrapped = unwrap_phase(&phase);
        let if_map = instantaneous_frequency(&phase);

        let (steps, bins) = phase.dim();
        for b in 0..bins {
            let mut acc = 0.0f32;
            for t in 0..steps {
                acc += if_map[[t, b]];
                assert!((acc - unwrapped[[t, b]]).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn rewrapped_cumulative_sum_matches_original_phase_mod_tau() {
        let phase = scrambled_phase(25, 6);
        let if_map = instantaneous_frequency(&phase);

        let (steps, bins) = phase.dim();
        for b in 0..bins {
            let mut acc = 0.0f32;
            for t in 0..steps {
                acc += if_map[[t, b]];
                let rewrapped = acc - TAU * (acc / TAU).round();
                let want = phase[[t, b]];
                let delta = rewrapped - want;
                let delta = delta - TAU * (delta / TAU).round();
                assert!(delta.abs() < 1e-3, "t={t} b={b} delta={delta}");
            }
        }
    }

    #[test]
    fn exact_pi_jumps_keep_their_sign() {
        // +π stays +π and −π stays −π, so nothing needs correcting
        let phase = ndarray::arr2(&[[0.0f32], [PI], [0.0]]);
        assert_eq!(unwrap_phase(&phase), phase);

        let phase = ndarray::arr2(&[[0.0f32], [-PI], [0.0]]);
        assert_eq!(unwrap_phase(&phase), phase);
    }

    #[test]
    fn first_step_equals_unwrapped_phase() {
        let phase = scrambled_phase(10, 3);
        let if_map = instantaneous_frequency(&phase);
        for b in 0..3 {
            assert_eq!(if_map[[0, b]], phase[[0, b]]);
        }
    }
}
