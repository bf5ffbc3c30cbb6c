//! Build-wide constants shared by the pipeline stages.

/// Default STFT hop in samples.
pub const DEFAULT_HOP_LENGTH: usize = 256;
/// Default STFT window length in samples; also the canonical time dimension.
pub const DEFAULT_WIN_LENGTH: usize = 1024;
/// Nominal sample rate used to build the mel filter bank.
pub const DEFAULT_SAMPLE_RATE: usize = 16_000;
/// Samples per processing batch.
pub const DEFAULT_BATCH_SIZE: usize = 128;
/// Persistence worker-pool size.
pub const DEFAULT_WRITE_JOBS: usize = 64;

/// Canonical frequency width of persisted spectral artifacts.
pub const SPEC_BINS: usize = 128;
/// Mel bins in the projected artifacts (same width as the linear side).
pub const MEL_BINS: usize = 128;

/// Additive guard used in every `ln(x + ε)` of the pipeline. Downstream
/// consumers were trained against this exact value; do not change it.
pub const LOG_GUARD: f32 = 1.0e-6;

/// Placeholder frame height/width for audio-only corpora.
pub const DEFAULT_FRAME_HEIGHT: usize = 64;
pub const DEFAULT_FRAME_WIDTH: usize = 64;
/// RGB.
pub const DEFAULT_FRAME_CHANNELS: usize = 3;
