//! Random access, slicing, time bookkeeping and write-through over chains
//! assembled from real segment files.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use trajchain::format::{FrmFormat, TrajectoryFormat, XyzFormat};
use trajchain::{ChainOptions, ChainReader, Frame, SegmentSource, TrajError};

const N_ATOMS: usize = 2;

fn positions_for(step: i64) -> Vec<[f32; 3]> {
    vec![[step as f32, 0.5, -1.0], [2.0, step as f32, 0.25]]
}

fn write_with(format: &dyn TrajectoryFormat, path: &Path, steps: RangeInclusive<i64>) {
    let mut writer = format.create(path, N_ATOMS).expect("create segment");
    for step in steps {
        writer
            .write_frame(&Frame::new(step, step as f64, positions_for(step)))
            .expect("write frame");
    }
    writer.finish().expect("finish segment");
}

fn frm_segment(dir: &Path, name: &str, steps: RangeInclusive<i64>) -> PathBuf {
    let path = dir.join(name);
    write_with(&FrmFormat, &path, steps);
    path
}

fn open_verbatim(parts: Vec<PathBuf>) -> ChainReader {
    ChainReader::open(parts, ChainOptions::default()).expect("open chain")
}

#[test]
fn verbatim_chain_counts_every_frame() {
    let dir = TempDir::new().unwrap();
    let part = frm_segment(dir.path(), "part.frm", 0..=9);

    let mut chain = open_verbatim(vec![part.clone(), part.clone(), part]);
    assert_eq!(chain.n_frames(), 30);
    assert_eq!(chain.n_atoms(), N_ATOMS);

    // the same segment repeats verbatim, so frame 10 replays frame 0
    let first = chain.seek(0).expect("seek").clone();
    let replay = chain.seek(10).expect("seek");
    assert_eq!(replay, &first);
}

#[test]
fn sequential_iteration_crosses_boundaries() {
    let dir = TempDir::new().unwrap();
    let parts = vec![
        frm_segment(dir.path(), "a.frm", 0..=9),
        frm_segment(dir.path(), "b.frm", 10..=19),
    ];

    let mut chain = open_verbatim(parts);
    let mut steps = Vec::new();
    while let Some(frame) = chain.advance().expect("advance") {
        steps.push(frame.step);
    }
    assert_eq!(steps, (0..=19).collect::<Vec<_>>());
    assert!(chain.advance().expect("advance").is_none());
}

#[test]
fn strided_slice_yields_expected_frames() {
    let dir = TempDir::new().unwrap();
    let parts = vec![
        frm_segment(dir.path(), "a.frm", 0..=9),
        frm_segment(dir.path(), "b.frm", 10..=19),
    ];

    let mut chain = open_verbatim(parts);
    let steps: Vec<i64> = chain
        .slice(Some(5), Some(17), Some(3))
        .expect("slice")
        .map(|frame| frame.expect("frame").step)
        .collect();
    assert_eq!(steps, vec![5, 8, 11, 14]);
}

#[test]
fn reversed_slice_walks_backwards() {
    let dir = TempDir::new().unwrap();
    let part = frm_segment(dir.path(), "part.frm", 0..=9);

    let mut chain = open_verbatim(vec![part]);
    let steps: Vec<i64> = chain
        .slice(None, None, Some(-3))
        .expect("slice")
        .map(|frame| frame.expect("frame").step)
        .collect();
    assert_eq!(steps, vec![9, 6, 3, 0]);
}

#[test]
fn slice_iterator_reports_exact_length() {
    let dir = TempDir::new().unwrap();
    let part = frm_segment(dir.path(), "part.frm", 0..=19);

    let mut chain = open_verbatim(vec![part]);
    let slice = chain.slice(Some(5), Some(17), Some(3)).expect("slice");
    assert_eq!(slice.len(), 4);
}

#[test]
fn seek_accepts_negative_frames_and_rejects_out_of_range() {
    let dir = TempDir::new().unwrap();
    let part = frm_segment(dir.path(), "part.frm", 0..=9);

    let mut chain = open_verbatim(vec![part]);
    assert_eq!(chain.seek(-1).expect("seek").step, 9);
    assert_eq!(chain.current_frame(), Some(9));

    let err = chain.seek(10).expect_err("should fail");
    assert!(matches!(err, TrajError::FrameOutOfRange { .. }));
    // a failed seek leaves the position untouched
    assert_eq!(chain.current_frame(), Some(9));

    assert!(matches!(
        chain.seek(-11),
        Err(TrajError::FrameOutOfRange { .. })
    ));
}

#[test]
fn dt_override_replaces_segment_times() {
    let dir = TempDir::new().unwrap();
    let parts = vec![
        frm_segment(dir.path(), "a.frm", 0..=9),
        frm_segment(dir.path(), "b.frm", 10..=19),
    ];

    let options = ChainOptions::builder().dt(0.25).build();
    let mut chain = ChainReader::open(parts, options).expect("open");

    for frame in 0..20 {
        let time = chain.time(frame as isize).expect("time");
        assert!((time - frame as f64 * 0.25).abs() < 1e-12);
    }

    chain.seek(8).expect("seek");
    let current = chain.current_time().expect("current time");
    assert!((current - 2.0).abs() < 1e-12);
}

#[test]
fn mixed_formats_chain_together() {
    let dir = TempDir::new().unwrap();
    let binary = frm_segment(dir.path(), "head.frm", 0..=4);
    let text = dir.path().join("tail.xyz");
    write_with(&XyzFormat, &text, 5..=9);

    let mut chain = open_verbatim(vec![binary, text]);
    assert_eq!(chain.n_frames(), 10);
    let steps: Vec<i64> = chain
        .iter()
        .map(|frame| frame.expect("frame").step)
        .collect();
    assert_eq!(steps, (0..=9).collect::<Vec<_>>());
}

#[test]
fn explicit_format_label_overrides_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.dat");
    write_with(&XyzFormat, &path, 0..=4);

    // without the label the extension is meaningless
    let err = ChainReader::open([path.clone()], ChainOptions::default()).expect_err("should fail");
    assert!(matches!(err, TrajError::UnknownFormat { .. }));

    let source = SegmentSource::with_format(path, "xyz");
    let mut chain = ChainReader::open([source], ChainOptions::default()).expect("open");
    assert_eq!(chain.n_frames(), 5);
    assert_eq!(chain.seek(2).expect("seek").step, 2);
}

#[test]
fn write_through_flattens_a_stitched_chain() {
    let dir = TempDir::new().unwrap();
    let parts = vec![
        frm_segment(dir.path(), "a.frm", 0..=5),
        frm_segment(dir.path(), "b.frm", 3..=9),
    ];

    let options = ChainOptions::builder().continuous(true).build();
    let mut chain = ChainReader::open(parts, options).expect("open");
    assert_eq!(chain.n_frames(), 10);

    let flat = dir.path().join("flat.frm");
    let mut writer = FrmFormat.create(&flat, chain.n_atoms()).expect("create");
    let written = chain.write_through(writer.as_mut()).expect("write through");
    assert_eq!(written, 10);
    drop(writer);

    let mut replay = open_verbatim(vec![flat]);
    assert_eq!(replay.n_frames(), 10);
    let steps: Vec<i64> = replay
        .iter()
        .map(|frame| frame.expect("frame").step)
        .collect();
    assert_eq!(steps, (0..=9).collect::<Vec<_>>());
    assert_eq!(replay.seek(4).expect("seek").positions, positions_for(4));
}

#[test]
fn rewind_after_exhaustion_replays_from_the_start() {
    let dir = TempDir::new().unwrap();
    let part = frm_segment(dir.path(), "part.frm", 0..=4);

    let mut chain = open_verbatim(vec![part]);
    while chain.advance().expect("advance").is_some() {}
    assert_eq!(chain.current_frame(), None);

    assert_eq!(chain.rewind().expect("rewind").step, 0);
    assert_eq!(chain.advance().expect("advance").map(|f| f.step), Some(1));
}
