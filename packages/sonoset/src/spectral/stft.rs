//! Windowed short-time Fourier transform.
//!
//! The FFT plan and the window are built once in [`SpectralTransform::new`]
//! and re-used for every chunk, so the transform is deterministic for a
//! fixed `{hop_length, win_length, window}` configuration.

use std::sync::Arc;

use ndarray::{Array1, Array2};
use rustfft::{Fft, FftPlanner, num_complex::Complex32};

use crate::config::WindowFunction;

/// Magnitude + phase of one chunk, both shaped (time_steps, freq_bins).
#[derive(Debug, Clone)]
pub struct SpectralFrame {
    /// Non-negative spectral magnitudes.
    pub magnitude: Array2<f32>,
    /// Angles in `[-π, π]`.
    pub phase: Array2<f32>,
}

/// Batch STFT front-end.
pub struct SpectralTransform {
    hop_length: usize,
    win_length: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

impl SpectralTransform {
    pub fn new(hop_length: usize, win_length: usize, window: WindowFunction) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(win_length);
        Self {
            hop_length,
            win_length,
            fft,
            window: window.sample(win_length),
        }
    }

    /// Retained bins of the real half-spectrum: `win_length / 2 + 1`.
    #[inline]
    pub const fn freq_bins(&self) -> usize {
        self.win_length / 2 + 1
    }

    /// Full frames obtainable from a chunk of `len` samples:
    /// `⌊(len − win) / hop⌋ + 1`, or zero when the chunk is too short.
    #[inline]
    pub const fn num_frames(&self, len: usize) -> usize {
        if len < self.win_length {
            0
        } else {
            (len - self.win_length) / self.hop_length + 1
        }
    }

    /// Transform one chunk. Returns `None` when the chunk yields no valid
    /// frame (shorter than `win_length`); callers filter such positions
    /// out of the batch instead of crashing.
    pub fn transform(&self, chunk: &[f32]) -> Option<SpectralFrame> {
        let steps = self.num_frames(chunk.len());
        if steps == 0 {
            return None;
        }
        let bins = self.freq_bins();
        let mut magnitude = Array2::zeros((steps, bins));
        let mut phase = Array2::zeros((steps, bins));
        let mut buf = vec![Complex32::ZERO; self.win_length];

        for t in 0..steps {
            let start = t * self.hop_length;
            let frame = &chunk[start..start + self.win_length];

            // window + FFT
            for (dst, (&x, &w)) in buf.iter_mut().zip(frame.iter().zip(&self.window)) {
                dst.re = x * w;
                dst.im = 0.0;
            }
            self.fft.process(&mut buf);

            // keep the non-negative frequencies
            for (b, c) in buf.iter().take(bins).enumerate() {
                magnitude[[t, b]] = (c.re * c.re + c.im * c.im).sqrt();
                phase[[t, b]] = c.im.atan2(c.re);
            }
        }
        Some(SpectralFrame { magnitude, phase })
    }

    /// Transform a batch of chunks, one `Option` per input position so the
    /// caller can drop invalid chunks without losing alignment.
    pub fn transform_batch(&self, chunks: &[Array1<f32>]) -> Vec<Option<SpectralFrame>> {
        chunks
            .iter()
            .map(|c| self.transform(c.as_slice()?))
            .collect()
    }
}

/* --------------------------------------------------------------------- */
/*  Unit-tests                                                           */
