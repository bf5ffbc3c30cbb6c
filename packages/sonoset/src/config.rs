//! Build configuration.
//!
//! `BuildConfig` covers the whole recognized option surface: STFT geometry,
//! window function, batching, shuffle and the persistence pool size. It
//! deserializes from TOML and every field has a default matching the
//! reference build configuration, so a partial file is enough.

use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_HOP_LENGTH, DEFAULT_SAMPLE_RATE, DEFAULT_WIN_LENGTH,
    DEFAULT_WRITE_JOBS,
};

/* ─────────────────────── window functions ─────────────────────── */

/// Analysis window applied to every STFT frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    #[default]
    Hann,
    Hamming,
    Blackman,
}

impl WindowFunction {
    /// Sample the (symmetric) window at `len` points.
    pub fn sample(self, len: usize) -> Vec<f32> {
        if len < 2 {
            return vec![1.0; len];
        }
        let denom = (len - 1) as f32;
        (0..len)
            .map(|n| {
                let x = 2.0 * PI * n as f32 / denom;
                match self {
                    Self::Hann => 0.5 - 0.5 * x.cos(),
                    Self::Hamming => 0.54 - 0.46 * x.cos(),
                    Self::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
                }
            })
            .collect()
    }
}

/* ─────────────────────── build configuration ──────────────────── */

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// STFT hop in samples.
    pub hop_length: usize,
    /// STFT window length in samples / canonical time dimension.
    pub win_length: usize,
    /// Window function name.
    pub window: WindowFunction,
    /// Nominal sample rate for the mel filter bank.
    pub sample_rate: usize,
    /// Samples per processing batch.
    pub batch_size: usize,
    /// Whether the chunk source randomizes order.
    pub shuffle: bool,
    /// Persistence worker-pool size.
    pub n_jobs: usize,
    /// Lower edge of the mel filter bank in Hz.
    pub fmin: f32,
    /// Upper edge of the mel filter bank in Hz; `None` means Nyquist.
    pub fmax: Option<f32>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            hop_length: DEFAULT_HOP_LENGTH,
            win_length: DEFAULT_WIN_LENGTH,
            window: WindowFunction::Hann,
            sample_rate: DEFAULT_SAMPLE_RATE,
            batch_size: DEFAULT_BATCH_SIZE,
            shuffle: false,
            n_jobs: DEFAULT_WRITE_JOBS,
            fmin: 0.0,
            fmax: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl BuildConfig {
    /// Load a configuration from a TOML file; missing keys fall back to the
    /// defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    #[inline]
    pub fn nyquist(&self) -> f32 {
        self.sample_rate as f32 / 2.0
    }

    /// Upper mel edge after resolving the Nyquist default.
    #[inline]
    pub fn mel_fmax(&self) -> f32 {
        self.fmax.unwrap_or_else(|| self.nyquist())
    }
}

/* --------------------------------------------------------------------- */
/*  Unit-tests                                                           */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_build() {
        let cfg = BuildConfig::default();
        assert_eq!(cfg.hop_length, 256);
        assert_eq!(cfg.win_length, 1024);
        assert_eq!(cfg.window, WindowFunction::Hann);
        assert_eq!(cfg.batch_size, 128);
        assert_eq!(cfg.n_jobs, 64);
        assert!(!cfg.shuffle);
        assert_eq!(cfg.mel_fmax(), 8000.0);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let cfg: BuildConfig =
            toml::from_str("win_length = 250\nhop_length = 1\nwindow = \"hamming\"")
                .expect("valid toml");
        assert_eq!(cfg.win_length, 250);
        assert_eq!(cfg.hop_length, 1);
        assert_eq!(cfg.window, WindowFunction::Hamming);
        // untouched fields keep their defaults
        assert_eq!(cfg.batch_size, 128);
    }

    #[test]
    fn hann_window_is_symmetric_and_zero_edged() {
        let w = WindowFunction::Hann.sample(64);
        assert!(w[0].abs() < 1e-6);
        assert!(w[63].abs() < 1e-6);
        for i in 0..32 {
            assert!((w[i] - w[63 - i]).abs() < 1e-5);
        }
    }
}
