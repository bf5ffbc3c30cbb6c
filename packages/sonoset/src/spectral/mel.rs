//! Projection of canonical spectral arrays onto the mel scale.
//!
//! The (128 linear × 128 mel) triangular filter bank is built once per run
//! and is read-only afterwards, so it is safe to share across threads
//! without synchronization.

use ndarray::Array2;

use crate::constants::{LOG_GUARD, MEL_BINS, SPEC_BINS};

/// Precomputed linear-bin → mel-bin weighting matrix.
pub struct MelProjector {
    /// (SPEC_BINS, MEL_BINS); `mel = linear · weights`.
    weights: Array2<f32>,
}

impl MelProjector {
    /// Build the filter bank for a nominal `sample_rate` and the
    /// `[fmin, fmax]` frequency range (`None` → Nyquist).
    pub fn new(sample_rate: usize, fmin: f32, fmax: Option<f32>) -> Self {
        let nyquist = sample_rate as f32 / 2.0;
        let fmax = fmax.unwrap_or(nyquist);
        Self {
            weights: filter_bank(SPEC_BINS, MEL_BINS, nyquist, fmin, fmax),
        }
    }

    /// Project the canonical (log-magnitude, instantaneous-frequency) pair
    /// into (log mel spectrogram, mel instantaneous frequency).
    ///
    /// The log-magnitude was produced upstream as `ln(m + 1e-6)`; it is
    /// exponentiated, mel-projected, then re-logged with the same guard.
    /// Instantaneous frequency is a plain linear combination.
    pub fn project(&self, log_mag: &Array2<f32>, if_map: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
        let magnitude = log_mag.mapv(f32::exp);
        let log_mel_spec = magnitude.dot(&self.weights).mapv(|v| (v + LOG_GUARD).ln());
        let mel_if = if_map.dot(&self.weights);
        (log_mel_spec, mel_if)
    }

    #[inline]
    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }
}

/* ───────────────────────── filter bank ────────────────────────── */

fn filter_bank(
    linear_bins: usize,
    mel_bins: usize,
    nyquist: f32,
    fmin: f32,
    fmax: f32,
) -> Array2<f32> {
    let mel_lo = freq_to_mel(fmin);
    let mel_hi = freq_to_mel(fmax);
    let mel_step = (mel_hi - mel_lo) / (mel_bins + 1) as f32;

    // triangle edges: mel-spaced center frequencies
    let edges: Vec<f32> = (0..=mel_bins + 1)
        .map(|i| mel_to_freq(mel_lo + i as f32 * mel_step))
        .collect();

    let mut bank = Array2::zeros((linear_bins, mel_bins));
    for m in 0..mel_bins {
        let f_left = edges[m];
        let f_center = edges[m + 1];
        let f_right = edges[m + 2];

        for bin in 0..linear_bins {
            let freq = bin as f32 * nyquist / (linear_bins - 1) as f32;
            bank[[bin, m]] = if freq < f_left || freq > f_right {
                0.0
            } else if freq <= f_center {
                (freq - f_left) / (f_center - f_left)
            } else {
                (f_right - freq) / (f_right - f_center)
            };
        }
    }
    bank
}

#[inline]
fn freq_to_mel(f: f32) -> f32 {
    1127.0 * (1.0 + f / 700.0).ln()
}

#[inline]
fn mel_to_freq(m: f32) -> f32 {
    700.0 * ((m / 1127.0).exp() - 1.0)
}

/* --------------------------------------------------------------------- */
/*  Unit-tests                                                           */
