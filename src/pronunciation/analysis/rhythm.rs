use serde::Serialize;
use tracing::debug;

use crate::config::RhythmRules;
use crate::pronunciation::features::frames::rms_envelope;
use crate::pronunciation::features::peaks::find_peaks;
use crate::pronunciation::features::statistics::{diff, mean, std_dev};
use crate::pronunciation::features::stft::{frame_norms, magnitude_spectrogram, spectral_flux};
use crate::pronunciation::features::FrameLayout;
use crate::pronunciation::waveform::{ENERGY_LAYOUT, TARGET_SAMPLE_RATE};
use crate::pronunciation::{Result, Waveform};

use super::{clamp_unit, Analyzer, FeatureSummary};

pub const ONSET_LAYOUT: FrameLayout = FrameLayout::new(2048, 512, TARGET_SAMPLE_RATE);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StressPattern {
    Natural,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RhythmSummary {
    pub tempo: f64,
    pub beat_count: usize,
    pub onset_count: usize,
    pub rhythm_consistency: f64,
    pub stress_pattern: StressPattern,
    pub score: f64,
}

impl Default for RhythmSummary {
    fn default() -> Self {
        Self {
            tempo: 0.0,
            beat_count: 0,
            onset_count: 0,
            rhythm_consistency: 0.0,
            stress_pattern: StressPattern::Flat,
            score: 0.0,
        }
    }
}

impl FeatureSummary for RhythmSummary {
    fn score(&self) -> f64 {
        self.score
    }
}

/// Onset envelope and what was derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct OnsetAnalysis {
    /// Scale-invariant spectral flux per frame.
    pub envelope: Vec<f64>,
    /// Frame indices of detected onsets.
    pub onsets: Vec<usize>,
    pub tempo: f64,
    /// Frame indices of the pulse train.
    pub beats: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct RhythmAnalyzer {
    rules: RhythmRules,
}

impl RhythmAnalyzer {
    pub fn new(rules: RhythmRules) -> Self {
        Self { rules }
    }

    pub fn onsets(&self, waveform: &Waveform) -> OnsetAnalysis {
        let spectra = magnitude_spectrogram(waveform.samples(), ONSET_LAYOUT).into_values();
        let envelope = onset_envelope(&spectra);
        let onsets = self.pick_onsets(&envelope);
        let lag = self.tempo_lag(&envelope);
        let tempo = lag.map_or(0.0, |lag| 60.0 * ONSET_LAYOUT.frame_rate() / lag as f64);
        let beats = lag.map_or_else(Vec::new, |lag| track_beats(&envelope, &onsets, lag));
        OnsetAnalysis {
            envelope,
            onsets,
            tempo,
            beats,
        }
    }

    pub fn stress_pattern(&self, waveform: &Waveform) -> StressPattern {
        let envelope = rms_envelope(waveform.samples(), ENERGY_LAYOUT);
        let level = mean(envelope.values()).unwrap_or(0.0);
        if find_peaks(envelope.values(), level * self.rules.stress_peak_ratio).is_empty() {
            StressPattern::Flat
        } else {
            StressPattern::Natural
        }
    }

    pub fn sub_score(&self, tempo: f64, consistency: f64, stress: StressPattern) -> f64 {
        let stress_credit = match stress {
            StressPattern::Natural => self.rules.natural_stress_credit,
            StressPattern::Flat => self.rules.flat_stress_credit,
        };
        let credit = self.rules.tempo_band.credit(tempo)
            + consistency * self.rules.consistency_weight
            + stress_credit;
        clamp_unit(credit.min(1.0))
    }

    /// Local maxima of the envelope at or above the onset threshold,
    /// keeping the earlier onset when two fall within the minimum gap.
    fn pick_onsets(&self, envelope: &[f64]) -> Vec<usize> {
        let min_gap =
            (self.rules.min_onset_gap_ms / 1000.0 * ONSET_LAYOUT.frame_rate()).round() as usize;
        let mut onsets: Vec<usize> = Vec::new();
        for peak in find_peaks(envelope, self.rules.onset_threshold) {
            match onsets.last() {
                Some(&last) if peak - last < min_gap => {}
                _ => onsets.push(peak),
            }
        }
        onsets
    }

    /// Autocorrelation lag (in frames) of the strongest periodicity,
    /// weighted by a log-normal tempo prior.
    fn tempo_lag(&self, envelope: &[f64]) -> Option<usize> {
        let peak = envelope.iter().copied().fold(0.0, f64::max);
        if peak < self.rules.onset_threshold {
            return None;
        }
        let frame_rate = ONSET_LAYOUT.frame_rate();
        let shortest = ((60.0 * frame_rate / self.rules.max_bpm).floor() as usize).max(1);
        let longest = ((60.0 * frame_rate / self.rules.min_bpm).ceil() as usize)
            .min(envelope.len().saturating_sub(1));

        let mut best: Option<(usize, f64)> = None;
        for lag in shortest..=longest {
            let correlation: f64 = envelope
                .iter()
                .zip(envelope[lag..].iter())
                .map(|(a, b)| a * b)
                .sum();
            let bpm = 60.0 * frame_rate / lag as f64;
            let octaves = (bpm / self.rules.prior_bpm).log2() / self.rules.prior_octaves;
            let weighted = correlation * (-0.5 * octaves * octaves).exp();
            if weighted > best.map_or(0.0, |(_, value)| value) {
                best = Some((lag, weighted));
            }
        }
        best.map(|(lag, _)| lag)
    }
}

impl Analyzer for RhythmAnalyzer {
    type Summary = RhythmSummary;
    const NAME: &'static str = "rhythm";

    fn analyze(&self, waveform: &Waveform) -> Result<RhythmSummary> {
        let analysis = self.onsets(waveform);
        let onset_times: Vec<f64> = analysis
            .onsets
            .iter()
            .map(|&frame| ONSET_LAYOUT.frame_time(frame))
            .collect();
        let rhythm_consistency = if onset_times.len() > 1 {
            std_dev(&diff(&onset_times)).map_or(0.0, |spread| 1.0 / (1.0 + spread))
        } else {
            0.0
        };
        let stress_pattern = self.stress_pattern(waveform);
        debug!(
            tempo = analysis.tempo,
            onsets = onset_times.len(),
            beats = analysis.beats.len(),
            ?stress_pattern,
            "rhythm analysis complete"
        );
        Ok(RhythmSummary {
            tempo: analysis.tempo,
            beat_count: analysis.beats.len(),
            onset_count: onset_times.len(),
            rhythm_consistency,
            stress_pattern,
            score: self.sub_score(analysis.tempo, rhythm_consistency, stress_pattern),
        })
    }

    fn fallback(&self) -> RhythmSummary {
        RhythmSummary::default()
    }
}

/// Spectral flux divided by the mean frame magnitude, so the envelope does
/// not depend on recording level.
fn onset_envelope(spectra: &[Vec<f64>]) -> Vec<f64> {
    let flux = spectral_flux(spectra);
    let level = mean(&frame_norms(spectra)).unwrap_or(0.0);
    if level <= f64::EPSILON {
        return vec![0.0; flux.len()];
    }
    flux.into_iter().map(|value| value / level).collect()
}

/// Pulse train with period `lag` starting at the first onset (or the
/// envelope maximum), each pulse snapped to the strongest frame within
/// ±10% of the period.
fn track_beats(envelope: &[f64], onsets: &[usize], lag: usize) -> Vec<usize> {
    let start = onsets.first().copied().unwrap_or_else(|| argmax(envelope, 0, envelope.len()));
    let tolerance = ((lag as f64) * 0.1).round() as usize;
    let mut beats = Vec::new();
    let mut expected = start;
    while expected < envelope.len() {
        let low = expected.saturating_sub(tolerance);
        let high = (expected + tolerance + 1).min(envelope.len());
        let beat = argmax(envelope, low, high);
        beats.push(beat);
        expected = beat + lag;
    }
    beats
}

fn argmax(values: &[f64], start: usize, end: usize) -> usize {
    (start..end)
        .max_by(|&a, &b| values[a].total_cmp(&values[b]).then(b.cmp(&a)))
        .unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> RhythmAnalyzer {
        RhythmAnalyzer::new(RhythmRules::default())
    }

    #[test]
    fn sub_score_rewards_speech_tempo_and_stress() {
        let score = analyzer().sub_score(120.0, 0.5, StressPattern::Natural);
        assert!((score - (0.5 + 0.15 + 0.2)).abs() < 1e-12);
        let flat = analyzer().sub_score(260.0, 0.0, StressPattern::Flat);
        assert!((flat - 0.1).abs() < 1e-12);
        let wide = analyzer().sub_score(35.0, 1.0, StressPattern::Flat);
        assert!((wide - (0.3 + 0.3 + 0.1)).abs() < 1e-12);
    }

    #[test]
    fn onsets_respect_minimum_gap() {
        // Two frames apart is ~64 ms, just above the 50 ms gap (2 frames).
        let envelope = [0.0, 1.0, 0.0, 0.9, 0.0, 0.0, 0.0, 0.8, 0.0];
        assert_eq!(analyzer().pick_onsets(&envelope), vec![1, 3, 7]);

        let wider = RhythmAnalyzer::new(RhythmRules {
            min_onset_gap_ms: 100.0,
            ..RhythmRules::default()
        });
        assert_eq!(wider.pick_onsets(&envelope), vec![1, 7]);
    }

    #[test]
    fn weak_envelope_has_no_tempo() {
        assert_eq!(analyzer().tempo_lag(&[0.01; 200]), None);
    }

    #[test]
    fn periodic_envelope_recovers_its_period() {
        // Pulses every 16 frames at 31.25 frames/s is ~117 BPM.
        let mut envelope = vec![0.0; 320];
        for frame in (4..320).step_by(16) {
            envelope[frame] = 1.0;
        }
        let lag = analyzer().tempo_lag(&envelope).unwrap();
        assert_eq!(lag, 16);
        let beats = track_beats(&envelope, &[4], lag);
        assert_eq!(beats.first(), Some(&4));
        assert!(beats.windows(2).all(|pair| pair[1] - pair[0] == 16));
    }

    #[test]
    fn silent_spectra_give_flat_envelope() {
        let spectra = vec![vec![0.0; 8]; 5];
        assert_eq!(onset_envelope(&spectra), vec![0.0; 5]);
    }
}
