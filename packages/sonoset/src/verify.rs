//! Dataset consistency checks.
//!
//! Enforces the downstream consumer contract: every index present under
//! `frame/` exists in the other three trees, and both spectral artifacts
//! are (T, 128) with matching T. Checking stops at the first violation —
//! a dataset either satisfies the contract or it does not.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use ndarray_npy::ReadNpyExt;
use thiserror::Error;

use crate::constants::SPEC_BINS;
use crate::writer::Artifact;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no samples under {0}")]
    Empty(PathBuf),
    #[error("missing artifact {0}")]
    MissingArtifact(PathBuf),
    #[error("read {path}: {source}")]
    Npy {
        path: PathBuf,
        #[source]
        source: ndarray_npy::ReadNpyError,
    },
    #[error("sample {index}: {artifact} is ({rows}, {cols}), want width {SPEC_BINS}")]
    BadShape {
        index: u64,
        artifact: &'static str,
        rows: usize,
        cols: usize,
    },
    #[error("sample {index}: log_mel_spec has {spec_rows} time steps but mel_if has {if_rows}")]
    TimeMismatch {
        index: u64,
        spec_rows: usize,
        if_rows: usize,
    },
}

/// Summary of a dataset that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub samples: usize,
    pub first_index: u64,
    pub last_index: u64,
}

/// Verify the four artifact trees under `root` against the consumer
/// contract.
pub fn verify_dataset(root: &Path) -> Result<VerifyReport, VerifyError> {
    let indices = frame_indices(root)?;
    let (Some(&first_index), Some(&last_index)) = (indices.first(), indices.last()) else {
        return Err(VerifyError::Empty(root.to_path_buf()));
    };

    for &index in &indices {
        for artifact in [Artifact::Audio, Artifact::LogMelSpec, Artifact::MelIf] {
            let path = artifact_file(root, artifact, index);
            if !path.is_file() {
                return Err(VerifyError::MissingArtifact(path));
            }
        }

        let spec = read_spectral(root, Artifact::LogMelSpec, index)?;
        let mel_if = read_spectral(root, Artifact::MelIf, index)?;
        for (artifact, arr) in [(Artifact::LogMelSpec, &spec), (Artifact::MelIf, &mel_if)] {
            if arr.ncols() != SPEC_BINS {
                return Err(VerifyError::BadShape {
                    index,
                    artifact: artifact.dir(),
                    rows: arr.nrows(),
                    cols: arr.ncols(),
                });
            }
        }
        if spec.nrows() != mel_if.nrows() {
            return Err(VerifyError::TimeMismatch {
                index,
                spec_rows: spec.nrows(),
                if_rows: mel_if.nrows(),
            });
        }
    }

    Ok(VerifyReport {
        samples: indices.len(),
        first_index,
        last_index,
    })
}

/* ─────────────────────────── helpers ──────────────────────────── */

fn artifact_file(root: &Path, artifact: Artifact, index: u64) -> PathBuf {
    root.join(artifact.dir()).join(Artifact::file_name(index))
}

/// Sorted indices present under `frame/`; a missing tree reads as empty.
fn frame_indices(root: &Path) -> Result<Vec<u64>, VerifyError> {
    let dir = root.join(Artifact::Frame.dir());
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(VerifyError::Empty(root.to_path_buf()));
        }
        Err(source) => return Err(VerifyError::Io { path: dir, source }),
    };
    let set: BTreeSet<u64> = entries
        .filter_map(|e| {
            let path = e.ok()?.path();
            let stem = path.file_stem()?.to_str()?;
            stem.parse::<u64>().ok()
        })
        .collect();
    Ok(set.into_iter().collect())
}

fn read_spectral(root: &Path, artifact: Artifact, index: u64) -> Result<Array2<f32>, VerifyError> {
    let path = artifact_file(root, artifact, index);
    let file = File::open(&path).map_err(|source| VerifyError::Io {
        path: path.clone(),
        source,
    })?;
    Array2::<f32>::read_npy(file).map_err(|source| VerifyError::Npy { path, source })
}
