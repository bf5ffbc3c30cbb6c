//! sonoset – public crate root
//! ===========================
//! Turns paired audio/video recordings into a synchronized, indexed,
//! multi-modal training dataset. For every time-aligned chunk the build
//! persists four artifacts under four sibling directory trees sharing one
//! zero-padded global index:
//!
//! * `frame/`        – the video frame
//! * `audio/`        – the raw audio chunk
//! * `log_mel_spec/` – log-magnitude mel spectrogram, (win_length, 128)
//! * `mel_if/`       – mel instantaneous-frequency map, (win_length, 128)
//!
//! Pipeline: [`source::ChunkSource`] → [`spectral::SpectralTransform`] →
//! instantaneous frequency + log magnitude → shape normalization →
//! [`spectral::MelProjector`] → [`writer::ParallelWriter`], driven one
//! batch at a time by [`builder::DatasetBuilder`].
//!
//! Transform stages are pure in-memory computation; persistence is the
//! only concurrency boundary (a bounded worker pool of independent
//! per-file writes).
#![deny(unsafe_code)]

/* ────────────────────────  sub-modules  ─────────────────────────────── */
pub mod builder;
pub mod config;
pub mod constants;
pub mod sample;
pub mod source;
pub mod spectral;
pub mod verify;
pub mod writer;

/* ────────── public façade & re-exports ──────────────────────────────── */
pub use builder::{BuildError, BuildState, DatasetBuilder, RunSummary};
pub use config::{BuildConfig, ConfigError, WindowFunction};
pub use sample::Sample;
pub use source::{ChunkSource, MemoryChunkSource, RawPair, SourceError};
pub use spectral::{
    MelProjector, ShapeError, SpectralFrame, SpectralTransform, instantaneous_frequency,
    normalize, unwrap_phase,
};
pub use verify::{VerifyError, VerifyReport, verify_dataset};
pub use writer::{Artifact, BatchReport, ParallelWriter, WriterError};
