use serde::Serialize;
use tracing::debug;

use crate::config::FormantRules;
use crate::pronunciation::features::peaks::find_peaks;
use crate::pronunciation::features::statistics::{mean, std_dev};
use crate::pronunciation::features::stft::magnitude_spectrogram;
use crate::pronunciation::features::FrameLayout;
use crate::pronunciation::waveform::TARGET_SAMPLE_RATE;
use crate::pronunciation::{Result, Waveform};

use super::{clamp_unit, Analyzer, FeatureSummary};

pub const FORMANT_LAYOUT: FrameLayout = FrameLayout::new(1024, 256, TARGET_SAMPLE_RATE);

/// Vowel-quality estimate from the two lowest spectral peaks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormantSummary {
    pub f1_mean: f64,
    pub f2_mean: f64,
    /// The third resonance is not estimated.
    pub f3_mean: f64,
    /// Population spread of every retained peak frequency, in Hz.
    pub formant_stability: f64,
    pub analyzed_frames: usize,
    pub best_vowel: Option<String>,
    pub score: f64,
}

impl FormantSummary {
    /// Summary reported when no frame yields two peaks.
    pub fn neutral(score: f64) -> Self {
        Self {
            f1_mean: 0.0,
            f2_mean: 0.0,
            f3_mean: 0.0,
            formant_stability: 0.0,
            analyzed_frames: 0,
            best_vowel: None,
            score,
        }
    }
}

impl FeatureSummary for FormantSummary {
    fn score(&self) -> f64 {
        self.score
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormantAnalyzer {
    rules: FormantRules,
}

impl FormantAnalyzer {
    pub fn new(rules: FormantRules) -> Self {
        Self { rules }
    }

    /// `(F1, F2)` in Hz for every sampled frame with at least two peaks.
    pub fn resonance_pairs(&self, waveform: &Waveform) -> Vec<(f64, f64)> {
        let spectra = magnitude_spectrogram(waveform.samples(), FORMANT_LAYOUT);
        spectra
            .iter()
            .step_by(self.rules.frame_stride.max(1))
            .filter_map(|frame| self.lowest_peaks(frame))
            .collect()
    }

    pub fn summarize(&self, pairs: &[(f64, f64)]) -> FormantSummary {
        let f1: Vec<f64> = pairs.iter().map(|&(f1, _)| f1).collect();
        let f2: Vec<f64> = pairs.iter().map(|&(_, f2)| f2).collect();
        let (Some(f1_mean), Some(f2_mean)) = (mean(&f1), mean(&f2)) else {
            return self.fallback();
        };
        let pooled: Vec<f64> = pairs.iter().flat_map(|&(a, b)| [a, b]).collect();
        let (score, best_vowel) = self.vowel_score(f1_mean, f2_mean);
        FormantSummary {
            f1_mean,
            f2_mean,
            f3_mean: 0.0,
            formant_stability: std_dev(&pooled).unwrap_or(0.0),
            analyzed_frames: pairs.len(),
            best_vowel: best_vowel.map(str::to_string),
            score,
        }
    }

    /// Best credit over the vowel table, and which vowel earned it.
    pub fn vowel_score(&self, f1: f64, f2: f64) -> (f64, Option<&str>) {
        let mut best = (0.0, None);
        for band in &self.rules.vowels {
            let mut credit = 0.0;
            if band.f1.contains(f1) {
                credit += self.rules.f1_credit;
            }
            if band.f2.contains(f2) {
                credit += self.rules.f2_credit;
            }
            if credit > best.0 {
                best = (credit, Some(band.vowel.as_str()));
            }
        }
        (clamp_unit(best.0.min(1.0)), best.1)
    }

    fn lowest_peaks(&self, magnitudes: &[f64]) -> Option<(f64, f64)> {
        let reference = magnitudes.iter().copied().fold(0.0, f64::max);
        if reference <= 0.0 {
            return None;
        }
        let peaks = find_peaks(magnitudes, reference * self.rules.peak_threshold);
        match peaks.as_slice() {
            [first, second, ..] => Some((
                FORMANT_LAYOUT.bin_frequency(*first as f64),
                FORMANT_LAYOUT.bin_frequency(*second as f64),
            )),
            _ => None,
        }
    }
}

impl Analyzer for FormantAnalyzer {
    type Summary = FormantSummary;
    const NAME: &'static str = "formant";

    fn analyze(&self, waveform: &Waveform) -> Result<FormantSummary> {
        let pairs = self.resonance_pairs(waveform);
        debug!(frames = pairs.len(), "formant peaks collected");
        Ok(self.summarize(&pairs))
    }

    fn fallback(&self) -> FormantSummary {
        FormantSummary::neutral(self.rules.fallback_score)
    }
}
