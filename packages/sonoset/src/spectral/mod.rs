//! Spectral feature extraction.
//!
//! 1. [`stft`] — windowed STFT → magnitude + phase per chunk.
//! 2. [`phase`] — phase unwrapping → instantaneous frequency.
//! 3. [`shape`] — canonical (win_length, 128) normalization.
//! 4. [`mel`] — projection onto the mel filter bank.
//!
//! Every stage is a pure in-memory transformation; nothing here touches
//! the filesystem.

pub mod mel;
pub mod phase;
pub mod shape;
pub mod stft;

pub use mel::MelProjector;
pub use phase::{instantaneous_frequency, unwrap_phase};
pub use shape::{ShapeError, normalize};
pub use stft::{SpectralFrame, SpectralTransform};
