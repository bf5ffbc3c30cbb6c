//! ParallelWriter integration tests: index-consistent trees, atomic
//! naming, best-effort failure isolation.

use std::collections::BTreeSet;
use std::fs;

use ndarray::{Array1, Array2, Array3};
use sonoset::constants::SPEC_BINS;
use sonoset::{Artifact, ParallelWriter, Sample};
use tempfile::tempdir;

fn sample(index: u64) -> Sample {
    Sample {
        index,
        frame: Array3::from_elem((4, 4, 3), index as f32),
        audio: Array1::from_elem(64, 0.5),
        log_mel_spec: Array2::from_elem((6, SPEC_BINS), -1.25),
        mel_if: Array2::zeros((6, SPEC_BINS)),
    }
}

#[test]
fn batch_of_n_fills_all_four_trees_with_contiguous_indices() {
    let dir = tempdir().expect("tempdir");
    let writer = ParallelWriter::create(dir.path(), 4).expect("writer");

    let samples: Vec<Sample> = (0..5).map(sample).collect();
    let report = writer.write_batch(&samples);
    assert_eq!(report.attempted, 5);
    assert_eq!(report.written, 5);
    assert!(report.failed.is_empty());

    for artifact in Artifact::ALL {
        let mut names: Vec<String> = fs::read_dir(dir.path().join(artifact.dir()))
            .expect("tree exists")
            .filter_map(|e| Some(e.ok()?.file_name().to_string_lossy().into_owned()))
            .collect();
        names.sort();
        let want: Vec<String> = (0..5u64).map(Artifact::file_name).collect();
        assert_eq!(names, want, "{}", artifact.dir());
    }
}

#[test]
fn file_names_are_fixed_width_and_sortable() {
    assert_eq!(Artifact::file_name(0), "00000000.npy");
    assert_eq!(Artifact::file_name(42), "00000042.npy");
    assert_eq!(Artifact::file_name(12_345_678), "12345678.npy");
    // lexicographic order matches numeric order at fixed width
    assert!(Artifact::file_name(9) < Artifact::file_name(10));
}

#[test]
fn no_tmp_files_remain_after_a_clean_batch() {
    let dir = tempdir().expect("tempdir");
    let writer = ParallelWriter::create(dir.path(), 2).expect("writer");
    writer.write_batch(&[sample(0), sample(1)]);

    for artifact in Artifact::ALL {
        for entry in fs::read_dir(dir.path().join(artifact.dir())).expect("tree") {
            let name = entry.expect("entry").file_name();
            assert!(
                !name.to_string_lossy().ends_with(".tmp"),
                "staging file leaked: {name:?}"
            );
        }
    }
}

#[test]
fn failed_artifact_reports_its_index_but_keeps_the_other_three() {
    let dir = tempdir().expect("tempdir");
    let writer = ParallelWriter::create(dir.path(), 4).expect("writer");

    // a directory squatting on the final path makes the rename fail for
    // exactly one artifact of exactly one index
    let blocked = dir
        .path()
        .join(Artifact::MelIf.dir())
        .join(Artifact::file_name(1));
    fs::create_dir_all(&blocked).expect("blocker");

    let samples: Vec<Sample> = (0..3).map(sample).collect();
    let report = writer.write_batch(&samples);

    assert_eq!(report.attempted, 3);
    assert_eq!(report.written, 2);
    assert_eq!(report.failed, BTreeSet::from([1u64]));

    // best-effort: the same index still has its other three artifacts
    for artifact in [Artifact::Frame, Artifact::Audio, Artifact::LogMelSpec] {
        assert!(
            dir.path()
                .join(artifact.dir())
                .join(Artifact::file_name(1))
                .is_file(),
            "{} missing for the failed index",
            artifact.dir()
        );
    }
    // neighbours are untouched
    assert!(
        dir.path()
            .join(Artifact::MelIf.dir())
            .join(Artifact::file_name(2))
            .is_file()
    );
}
