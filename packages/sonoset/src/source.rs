//! Chunk sources.
//!
//! A [`ChunkSource`] yields synchronized (video frame, audio chunk) pairs
//! in fixed-size batches. Decoding real recordings into raw arrays is a
//! collaborator concern; this module ships an in-memory source (used by
//! the tests and by anything that decodes upstream) plus a WAV-directory
//! loader for audio-only corpora.

use std::fs;
use std::path::{Path, PathBuf};

use hound::WavReader;
use log::{debug, warn};
use ndarray::{Array1, Array3};
use rand::seq::SliceRandom;

use crate::constants::{DEFAULT_FRAME_CHANNELS, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH};

/// One synchronized (frame, audio) pair as produced by a source.
#[derive(Debug, Clone)]
pub struct RawPair {
    /// (height, width, channels).
    pub frame: Array3<f32>,
    /// Fixed-length amplitude samples.
    pub audio: Array1<f32>,
}

/// Stream of batches of synchronized pairs.
pub trait ChunkSource {
    /// Next batch, or `None` once the source is exhausted. The final batch
    /// may be smaller than the configured batch size.
    fn next_batch(&mut self) -> Option<Vec<RawPair>>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("wav: {0}")]
    Wav(#[from] hound::Error),
    #[error("no usable audio chunks under {0}")]
    Empty(PathBuf),
}

/* ─────────────────────── in-memory source ─────────────────────── */

/// Pre-loaded pairs handed out in batches, optionally shuffled once up
/// front.
pub struct MemoryChunkSource {
    pairs: Vec<RawPair>,
    batch_size: usize,
    cursor: usize,
}

impl MemoryChunkSource {
    pub fn new(pairs: Vec<RawPair>, batch_size: usize) -> Self {
        Self {
            pairs,
            batch_size: batch_size.max(1),
            cursor: 0,
        }
    }

    /// Like [`new`](Self::new) but with the pair order randomized.
    pub fn shuffled(mut pairs: Vec<RawPair>, batch_size: usize) -> Self {
        pairs.shuffle(&mut rand::rng());
        Self::new(pairs, batch_size)
    }

    /// Slice every WAV file under `dir` into consecutive chunks of
    /// `chunk_len` samples (multi-channel input is downmixed to mono, the
    /// trailing remainder is dropped). Each chunk is paired with a zero
    /// placeholder frame, since an audio-only corpus has no video track.
    pub fn from_wav_dir(
        dir: &Path,
        chunk_len: usize,
        batch_size: usize,
        shuffle: bool,
    ) -> Result<Self, SourceError> {
        let entries = fs::read_dir(dir).map_err(|source| SourceError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let frame_shape = (
            DEFAULT_FRAME_HEIGHT,
            DEFAULT_FRAME_WIDTH,
            DEFAULT_FRAME_CHANNELS,
        );
        let mut pairs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| SourceError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_none_or(|e| e != "wav") {
                continue;
            }
            let samples = match decode_wav_mono(&path) {
                Ok(s) => s,
                Err(e) => {
                    warn!("skipping {}: {e}", path.display());
                    continue;
                }
            };
            let before = pairs.len();
            for chunk in samples.chunks_exact(chunk_len) {
                pairs.push(RawPair {
                    frame: Array3::zeros(frame_shape),
                    audio: Array1::from(chunk.to_vec()),
                });
            }
            debug!(
                "{}: {} chunk(s) of {chunk_len} samples",
                path.display(),
                pairs.len() - before
            );
        }

        if pairs.is_empty() {
            return Err(SourceError::Empty(dir.to_path_buf()));
        }
        Ok(if shuffle {
            Self::shuffled(pairs, batch_size)
        } else {
            Self::new(pairs, batch_size)
        })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl ChunkSource for MemoryChunkSource {
    fn next_batch(&mut self) -> Option<Vec<RawPair>> {
        if self.cursor >= self.pairs.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.pairs.len());
        let batch = self.pairs[self.cursor..end].to_vec();
        self.cursor = end;
        Some(batch)
    }
}

/* ─────────────────────── wav decoding ─────────────────────────── */

fn decode_wav_mono(path: &Path) -> Result<Vec<f32>, hound::Error> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    if channels == 1 {
        return Ok(interleaved);
    }
    Ok(interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect())
}

/* --------------------------------------------------------------------- */
/*  Unit-tests                                                           */

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(tag: f32) -> RawPair {
        RawPair {
            frame: Array3::from_elem((2, 2, 3), tag),
            audio: Array1::from_elem(8, tag),
        }
    }

    #[test]
    fn batches_preserve_order_and_split_the_tail() {
        let mut src = MemoryChunkSource::new((0..5).map(|i| pair(i as f32)).collect(), 2);
        let sizes: Vec<usize> = std::iter::from_fn(|| src.next_batch().map(|b| b.len())).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn exhausted_source_stays_exhausted() {
        let mut src = MemoryChunkSource::new(vec![pair(1.0)], 4);
        assert!(src.next_batch().is_some());
        assert!(src.next_batch().is_none());
        assert!(src.next_batch().is_none());
    }

    #[test]
    fn shuffled_source_keeps_every_pair() {
        let pairs: Vec<RawPair> = (0..16).map(|i| pair(i as f32)).collect();
        let mut src = MemoryChunkSource::shuffled(pairs, 100);
        let batch = src.next_batch().expect("one batch");
        let mut tags: Vec<i32> = batch.iter().map(|p| p.audio[0] as i32).collect();
        tags.sort_unstable();
        assert_eq!(tags, (0..16).collect::<Vec<_>>());
    }
}
