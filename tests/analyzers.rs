mod common;

use approx::assert_abs_diff_eq;
use phonoscore::config::{BOUNDARY_FALLBACK_SCORE, FORMANT_FALLBACK_SCORE};
use phonoscore::pronunciation::analysis::{self, Analyzer};
use phonoscore::pronunciation::{
    BoundaryAnalyzer, FormantAnalyzer, PitchAnalyzer, PitchSummary, RhythmAnalyzer, StressPattern,
};

use common::{sine_wave, tone_bursts, waveform};

#[test]
fn silence_is_measured_not_failed() {
    let silence = waveform(vec![0.0; 32_000]);

    let pitch = analysis::run(&PitchAnalyzer::default(), &silence);
    assert!(!pitch.is_fallback());
    assert_eq!(pitch.summary(), &PitchSummary::default());

    let formant = analysis::run(&FormantAnalyzer::default(), &silence);
    assert!(!formant.is_fallback());
    assert_eq!(formant.summary().score, FORMANT_FALLBACK_SCORE);

    let rhythm = analysis::run(&RhythmAnalyzer::default(), &silence);
    assert!(!rhythm.is_fallback());
    assert_eq!(rhythm.summary().tempo, 0.0);
    assert_eq!(rhythm.summary().onset_count, 0);
    assert_eq!(rhythm.summary().stress_pattern, StressPattern::Flat);
}

#[test]
fn pure_tone_pitch_is_tracked() {
    let tone = waveform(sine_wave(220.0, 1.0, 0.5));
    let summary = PitchAnalyzer::default().analyze(&tone).unwrap();
    assert!(summary.voiced_frames > 0);
    assert_abs_diff_eq!(summary.mean_pitch, 220.0, epsilon = 4.0);
    assert!(summary.pitch_range < 10.0);
}

#[test]
fn recording_shorter_than_one_window_still_analyzes() {
    let clip = waveform(sine_wave(220.0, 0.05, 0.5));
    let summary = PitchAnalyzer::default().analyze(&clip).unwrap();
    assert_eq!(summary.voiced_frames, 1);
}

#[test]
fn single_tone_has_no_formant_pair() {
    let tone = waveform(sine_wave(440.0, 1.0, 0.5));
    let summary = FormantAnalyzer::default().analyze(&tone).unwrap();
    assert_eq!(summary.analyzed_frames, 0);
    assert_eq!(summary.score, FORMANT_FALLBACK_SCORE);
}

#[test]
fn two_tones_read_as_a_front_vowel() {
    let low = sine_wave(500.0, 1.0, 0.4);
    let high = sine_wave(1500.0, 1.0, 0.3);
    let mixed: Vec<f32> = low.iter().zip(high.iter()).map(|(a, b)| a + b).collect();
    let summary = FormantAnalyzer::default().analyze(&waveform(mixed)).unwrap();
    assert!(summary.analyzed_frames > 0);
    assert_abs_diff_eq!(summary.f1_mean, 500.0, epsilon = 1e-9);
    assert_abs_diff_eq!(summary.f2_mean, 1500.0, epsilon = 1e-9);
    assert_abs_diff_eq!(summary.formant_stability, 500.0, epsilon = 1e-9);
    assert_abs_diff_eq!(summary.score, 0.9, epsilon = 1e-12);
    assert_eq!(summary.best_vowel.as_deref(), Some("i"));
}

#[test]
fn constant_signal_has_no_boundaries() {
    let constant = waveform(vec![0.5; 16_000]);
    let summary = BoundaryAnalyzer::default().analyze(&constant).unwrap();
    assert_eq!(summary.boundary_count, 0);
    assert_eq!(summary.boundary_quality, 0.0);
    assert_eq!(summary.score, BOUNDARY_FALLBACK_SCORE);
}

#[test]
fn steady_tone_has_no_onsets_and_flat_stress() {
    let tone = waveform(sine_wave(150.0, 2.0, 0.5));
    let summary = RhythmAnalyzer::default().analyze(&tone).unwrap();
    assert_eq!(summary.onset_count, 0);
    assert_eq!(summary.rhythm_consistency, 0.0);
    assert_eq!(summary.stress_pattern, StressPattern::Flat);
}

#[test]
fn regular_bursts_have_consistent_rhythm() {
    let bursts = waveform(tone_bursts(440.0, 0.5, 0.1, 4.0));
    let summary = RhythmAnalyzer::default().analyze(&bursts).unwrap();
    assert!(summary.onset_count >= 4, "onsets: {}", summary.onset_count);
    assert!(summary.rhythm_consistency > 0.5);
    assert!(summary.tempo >= 30.0 && summary.tempo <= 300.0);
    assert!(summary.beat_count > 0);
    assert_eq!(summary.stress_pattern, StressPattern::Natural);
}
