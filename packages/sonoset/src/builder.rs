//! Batch orchestration.
//!
//! Drives one batch at a time from a [`ChunkSource`] through the spectral
//! stages and into the [`ParallelWriter`]:
//!
//! `Idle → Loading → Extracting → Normalizing → Projecting → Persisting →
//! (Idle | Failed)`
//!
//! Indices are assigned after invalid chunks are filtered (filtered
//! entries leave no gap) and the global counter advances only once the
//! batch's writes have all joined, so an index is never reused — failed
//! writes leave permanent, reported gaps instead.

use std::fs;
use std::path::Path;

use log::{debug, info, warn};

use crate::config::BuildConfig;
use crate::constants::{LOG_GUARD, SPEC_BINS};
use crate::sample::Sample;
use crate::source::{ChunkSource, RawPair};
use crate::spectral::{
    MelProjector, ShapeError, SpectralFrame, SpectralTransform, instantaneous_frequency, normalize,
};
use crate::writer::{Artifact, BatchReport, ParallelWriter, WriterError};

/// Orchestrator state. `Failed` is terminal and reached only on
/// structural errors; per-sample write failures return to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Loading,
    Extracting,
    Normalizing,
    Projecting,
    Persisting,
    Failed,
}

/// Structural build failures. Anything here implies a configuration bug
/// and stops the run.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Writer(#[from] WriterError),
}

/// Aggregate of a full run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: usize,
    pub attempted: usize,
    pub written: usize,
    /// Indices permanently skipped because an artifact write failed.
    pub failed: Vec<u64>,
}

/// Drives batches through transform → normalize → project → persist and
/// owns the global index counter. The counter is the only mutable shared
/// state of a run and is never touched by writer threads.
pub struct DatasetBuilder {
    cfg: BuildConfig,
    stft: SpectralTransform,
    mel: MelProjector,
    writer: ParallelWriter,
    next_index: u64,
    state: BuildState,
}

impl DatasetBuilder {
    /// Set up the transform front-end, the mel filter bank and the output
    /// directory trees under `out_dir`.
    pub fn create(cfg: BuildConfig, out_dir: impl AsRef<Path>) -> Result<Self, BuildError> {
        let writer = ParallelWriter::create(out_dir, cfg.n_jobs)?;
        let stft = SpectralTransform::new(cfg.hop_length, cfg.win_length, cfg.window);
        let mel = MelProjector::new(cfg.sample_rate, cfg.fmin, cfg.fmax);

        if stft.freq_bins() + 2 != SPEC_BINS && stft.freq_bins() != SPEC_BINS {
            warn!(
                "win_length {} yields {} frequency bins; normalization to {} will fail",
                cfg.win_length,
                stft.freq_bins(),
                SPEC_BINS
            );
        }

        Ok(Self {
            cfg,
            stft,
            mel,
            writer,
            next_index: 0,
            state: BuildState::Idle,
        })
    }

    /// Continue numbering from `index` (e.g. a resumed run).
    pub fn with_start_index(mut self, index: u64) -> Self {
        self.next_index = index;
        self
    }

    #[inline]
    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Next index that will be assigned; after a completed run this is the
    /// value to persist for a later resume.
    #[inline]
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Recompute the resume point of a dataset directory: one past the
    /// highest index present under `frame/` (0 for a fresh directory).
    pub fn resume_index(dataset_dir: &Path) -> u64 {
        let Ok(entries) = fs::read_dir(dataset_dir.join(Artifact::Frame.dir())) else {
            return 0;
        };
        entries
            .filter_map(|e| {
                let name = e.ok()?.path();
                let stem = name.file_stem()?.to_str()?;
                stem.parse::<u64>().ok()
            })
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Drain `source`, one batch at a time.
    pub fn run<S: ChunkSource>(&mut self, source: &mut S) -> Result<RunSummary, BuildError> {
        let mut summary = RunSummary::default();
        while let Some(batch) = source.next_batch() {
            let report = self.process_batch(batch)?;
            summary.batches += 1;
            summary.attempted += report.attempted;
            summary.written += report.written;
            summary.failed.extend(report.failed.iter().copied());
        }
        info!(
            "run complete: {} batch(es), {} written, {} failed, next index {}",
            summary.batches,
            summary.written,
            summary.failed.len(),
            self.next_index
        );
        Ok(summary)
    }

    /// Process one batch end to end. Structural errors flip the
    /// orchestrator into `Failed`; per-sample write failures are reported
    /// in the batch summary and leave it ready for the next batch.
    pub fn process_batch(&mut self, batch: Vec<RawPair>) -> Result<BatchReport, BuildError> {
        match self.try_batch(batch) {
            Ok(report) => {
                self.state = BuildState::Idle;
                Ok(report)
            }
            Err(e) => {
                self.state = BuildState::Failed;
                Err(e)
            }
        }
    }

    fn try_batch(&mut self, batch: Vec<RawPair>) -> Result<BatchReport, BuildError> {
        self.state = BuildState::Loading;
        let loaded = batch.len();

        self.state = BuildState::Extracting;
        let mut survivors: Vec<(RawPair, SpectralFrame)> = Vec::with_capacity(loaded);
        for pair in batch {
            let spectral = pair.audio.as_slice().and_then(|s| self.stft.transform(s));
            if let Some(frame) = spectral {
                survivors.push((pair, frame));
            }
        }
        if survivors.len() < loaded {
            debug!(
                "filtered {} chunk(s) shorter than the analysis window",
                loaded - survivors.len()
            );
        }
        if survivors.is_empty() {
            return Ok(BatchReport::default());
        }

        self.state = BuildState::Normalizing;
        let mut normalized = Vec::with_capacity(survivors.len());
        for (pair, frame) in survivors {
            let log_mag = frame.magnitude.mapv(|m| (m + LOG_GUARD).ln());
            let if_map = instantaneous_frequency(&frame.phase);
            let log_mag = normalize(&log_mag, self.cfg.win_length)?;
            let if_map = normalize(&if_map, self.cfg.win_length)?;
            normalized.push((pair, log_mag, if_map));
        }

        self.state = BuildState::Projecting;
        // index assignment: contiguous range sized to the filtered batch
        let samples: Vec<Sample> = normalized
            .into_iter()
            .enumerate()
            .map(|(offset, (pair, log_mag, if_map))| {
                let (log_mel_spec, mel_if) = self.mel.project(&log_mag, &if_map);
                Sample {
                    index: self.next_index + offset as u64,
                    frame: pair.frame,
                    audio: pair.audio,
                    log_mel_spec,
                    mel_if,
                }
            })
            .collect();

        self.state = BuildState::Persisting;
        let report = self.writer.write_batch(&samples);
        // the join barrier is behind us; only now may the counter move
        self.next_index += samples.len() as u64;
        info!(
            "batch summary: attempted={} written={} failed={:?}",
            report.attempted, report.written, report.failed
        );
        Ok(report)
    }
}
