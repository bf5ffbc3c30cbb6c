//! Parallel, index-consistent persistence.
//!
//! Each sample fans out into four `.npy` files under four sibling
//! directory trees (`frame/`, `audio/`, `log_mel_spec/`, `mel_if/`),
//! named by the shared zero-padded global index. Every (sample, artifact)
//! write is an independent task on a bounded rayon pool; a file is
//! serialized to memory, written to a `.tmp` sibling and renamed, so no
//! partial file is ever visible at its final path.
//!
//! Failures never abort the batch: the remaining artifacts of a failed
//! index are still attempted, and the index lands in the batch report's
//! failure set for the orchestrator to surface.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::warn;
use ndarray_npy::WriteNpyExt;
use parking_lot::Mutex;
use rayon::prelude::*;
use thiserror::Error;

use crate::sample::Sample;

/// The four persisted artifact kinds, in directory order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Frame,
    Audio,
    LogMelSpec,
    MelIf,
}

impl Artifact {
    pub const ALL: [Artifact; 4] = [
        Artifact::Frame,
        Artifact::Audio,
        Artifact::LogMelSpec,
        Artifact::MelIf,
    ];

    /// Directory name under the dataset root.
    pub const fn dir(self) -> &'static str {
        match self {
            Artifact::Frame => "frame",
            Artifact::Audio => "audio",
            Artifact::LogMelSpec => "log_mel_spec",
            Artifact::MelIf => "mel_if",
        }
    }

    /// Fixed-width decimal file name, lexicographically sortable.
    pub fn file_name(index: u64) -> String {
        format!("{index:08}.npy")
    }
}

/// Structural writer failures (directory setup, pool construction).
/// Per-file failures are reported through [`BatchReport`] instead.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("build write pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Error)]
enum ArtifactError {
    #[error("serialize: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Outcome of one persisted batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Samples handed to the writer.
    pub attempted: usize,
    /// Samples with all four artifacts on disk.
    pub written: usize,
    /// Indices with at least one failed artifact; permanently skipped.
    pub failed: BTreeSet<u64>,
}

/// Bounded worker pool writing batches of samples.
pub struct ParallelWriter {
    root: PathBuf,
    pool: rayon::ThreadPool,
}

impl ParallelWriter {
    /// Create the four artifact directories under `root` and spin up a
    /// pool of `n_jobs` writer threads.
    pub fn create(root: impl AsRef<Path>, n_jobs: usize) -> Result<Self, WriterError> {
        let root = root.as_ref().to_path_buf();
        for artifact in Artifact::ALL {
            let path = root.join(artifact.dir());
            fs::create_dir_all(&path).map_err(|source| WriterError::CreateDir { path, source })?;
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_jobs.max(1))
            .build()?;
        Ok(Self { root, pool })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_path(&self, artifact: Artifact, index: u64) -> PathBuf {
        self.root.join(artifact.dir()).join(Artifact::file_name(index))
    }

    /// Persist a batch. Blocks until every (sample, artifact) task has
    /// finished — the caller's join barrier before it advances the global
    /// index counter.
    pub fn write_batch(&self, samples: &[Sample]) -> BatchReport {
        let failed: Mutex<BTreeSet<u64>> = Mutex::new(BTreeSet::new());

        self.pool.install(|| {
            samples
                .par_iter()
                .flat_map_iter(|sample| Artifact::ALL.iter().map(move |&a| (sample, a)))
                .for_each(|(sample, artifact)| {
                    if let Err(e) = self.write_artifact(sample, artifact) {
                        warn!(
                            "write {}/{} failed: {e}",
                            artifact.dir(),
                            Artifact::file_name(sample.index)
                        );
                        failed.lock().insert(sample.index);
                    }
                });
        });

        let failed = failed.into_inner();
        BatchReport {
            attempted: samples.len(),
            written: samples.len() - failed.len(),
            failed,
        }
    }

    /// Serialize to memory, stage to `.tmp`, rename into place.
    fn write_artifact(&self, sample: &Sample, artifact: Artifact) -> Result<(), ArtifactError> {
        let mut buf = Vec::new();
        match artifact {
            Artifact::Frame => sample.frame.write_npy(&mut buf)?,
            Artifact::Audio => sample.audio.write_npy(&mut buf)?,
            Artifact::LogMelSpec => sample.log_mel_spec.write_npy(&mut buf)?,
            Artifact::MelIf => sample.mel_if.write_npy(&mut buf)?,
        }

        let path = self.artifact_path(artifact, sample.index);
        let tmp = path.with_extension("npy.tmp");
        fs::write(&tmp, &buf)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}
