//! The unit of persistence.

use ndarray::{Array1, Array2, Array3};

/// One fully-transformed dataset entry. All four artifacts are persisted
/// under the same zero-padded `index` across the four directory trees.
///
/// A `Sample` exists only within its batch's processing window: it is
/// built after index assignment and dropped once written (or once its
/// failure has been recorded).
#[derive(Debug, Clone)]
pub struct Sample {
    /// Globally unique, monotonically assigned; never reused.
    pub index: u64,
    /// Video frame, (height, width, channels).
    pub frame: Array3<f32>,
    /// Raw audio chunk.
    pub audio: Array1<f32>,
    /// Log-magnitude mel spectrogram, (win_length, 128).
    pub log_mel_spec: Array2<f32>,
    /// Mel instantaneous-frequency map, (win_length, 128).
    pub mel_if: Array2<f32>,
}
