//! Canonical shape normalization.
//!
//! Persisted spectral artifacts must be exactly (win_length, 128). The
//! frequency axis is widened by duplicating the final column twice (the
//! half-spectrum is two bins short of the canonical width), and the time
//! axis is truncated to the window length. Anything that still disagrees
//! with the canonical shape is a configuration bug, not a per-sample
//! condition, so it aborts the whole batch.

use ndarray::{Array2, s};
use thiserror::Error;

use crate::constants::SPEC_BINS;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    /// The normalized array does not match the canonical shape.
    #[error("normalized shape ({got_rows}, {got_cols}) does not match canonical ({want_rows}, {want_cols})")]
    Mismatch {
        got_rows: usize,
        got_cols: usize,
        want_rows: usize,
        want_cols: usize,
    },
}

/// Pad the frequency axis to the canonical width, truncate the time axis
/// to `win_length`, then hard-check the result against
/// (`win_length`, [`SPEC_BINS`]).
///
/// Arrays already at the canonical width pass through without padding, so
/// the normalizer is idempotent on canonical input.
pub fn normalize(arr: &Array2<f32>, win_length: usize) -> Result<Array2<f32>, ShapeError> {
    let mismatch = |rows, cols| ShapeError::Mismatch {
        got_rows: rows,
        got_cols: cols,
        want_rows: win_length,
        want_cols: SPEC_BINS,
    };

    let (rows, cols) = arr.dim();
    if cols == 0 {
        return Err(mismatch(rows, cols));
    }

    let padded = if cols == SPEC_BINS {
        arr.clone()
    } else {
        let last = arr.column(cols - 1).to_owned();
        let mut padded = Array2::zeros((rows, cols + 2));
        padded.slice_mut(s![.., ..cols]).assign(arr);
        padded.column_mut(cols).assign(&last);
        padded.column_mut(cols + 1).assign(&last);
        padded
    };

    // truncate-before-assert: trailing frames beyond the window are dropped
    let keep = padded.nrows().min(win_length);
    let out = padded.slice(s![..keep, ..]).to_owned();

    if out.dim() != (win_length, SPEC_BINS) {
        let (r, c) = out.dim();
        return Err(mismatch(r, c));
    }
    Ok(out)
}

/* --------------------------------------------------------------------- */
/*  Unit-tests                                                           */
