mod common;

use ndarray::Array2;
use phonoscore::config::AlignmentRules;
use phonoscore::pronunciation::{ErrorKind, ReferenceAligner};

use common::{sine_wave, vibrato, waveform};

fn ramp_features(frames: usize) -> Array2<f32> {
    Array2::from_shape_fn((frames, 13), |(i, j)| ((i + 1) as f32 * 0.3).sin() * (j + 1) as f32)
}

#[test]
fn recording_compared_with_itself_scores_one_hundred() {
    let recording = waveform(vibrato(120.0, 220.0, 2.0, 1.0));
    let result = ReferenceAligner::default()
        .align(&recording, &recording)
        .unwrap();
    assert_eq!(result.dtw_distance, 0.0);
    assert_eq!(result.dtw_score, 100.0);
    assert_eq!(result.user_mfcc_shape, result.ref_mfcc_shape);
    assert_eq!(result.user_mfcc_shape[1], 13);
}

#[test]
fn larger_constant_offset_never_scores_higher() {
    let reference = ramp_features(40);
    let aligner = ReferenceAligner::new(AlignmentRules::default());
    let near = aligner
        .align_features(&(&reference + 0.5), &reference)
        .unwrap();
    let far = aligner
        .align_features(&(&reference + 2.0), &reference)
        .unwrap();
    assert!(near.dtw_distance < far.dtw_distance);
    assert!(near.dtw_score >= far.dtw_score);
    assert!(near.dtw_normalized_distance < far.dtw_normalized_distance);
}

#[test]
fn different_lengths_align_end_to_end() {
    let aligner = ReferenceAligner::default();
    let result = aligner
        .align_features(&ramp_features(30), &ramp_features(45))
        .unwrap();
    assert!(result.dtw_path_length >= 45);
    assert!(result.dtw_path_length <= 30 + 45 - 1);
    assert_eq!(result.user_mfcc_shape, [30, 13]);
    assert_eq!(result.ref_mfcc_shape, [45, 13]);
}

#[test]
fn different_recordings_score_below_identical() {
    let aligner = ReferenceAligner::default();
    let reference = waveform(sine_wave(200.0, 1.0, 0.5));
    let candidate = waveform(vibrato(150.0, 400.0, 3.0, 1.2));
    let result = aligner.align(&candidate, &reference).unwrap();
    assert!(result.dtw_distance > 0.0);
    assert!(result.dtw_score < 100.0);
    assert!(result.dtw_score >= 0.0);
}

#[test]
fn empty_recording_is_an_alignment_error() {
    let aligner = ReferenceAligner::default();
    let empty = waveform(Vec::new());
    let reference = waveform(sine_wave(200.0, 0.5, 0.5));
    let err = aligner.align(&empty, &reference).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Alignment);
}
