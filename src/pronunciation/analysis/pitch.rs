use serde::Serialize;
use tracing::debug;

use crate::config::PitchRules;
use crate::pronunciation::features::stft::magnitude_spectrogram;
use crate::pronunciation::features::statistics::{max_value, mean, min_value, std_dev, steadiness};
use crate::pronunciation::features::{FrameLayout, FrameSeries};
use crate::pronunciation::waveform::TARGET_SAMPLE_RATE;
use crate::pronunciation::{Result, Waveform};

use super::{clamp_unit, Analyzer, FeatureSummary};

pub const PITCH_LAYOUT: FrameLayout = FrameLayout::new(2048, 512, TARGET_SAMPLE_RATE);

/// Intonation statistics over voiced frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PitchSummary {
    pub mean_pitch: f64,
    pub pitch_std: f64,
    pub pitch_range: f64,
    pub pitch_smoothness: f64,
    pub voiced_frames: usize,
    pub score: f64,
}

impl FeatureSummary for PitchSummary {
    fn score(&self) -> f64 {
        self.score
    }
}

/// Spectral-peak pitch tracker.
///
/// Each frame's estimate is the strongest local spectral maximum inside the
/// configured frequency range, refined by parabolic interpolation.
#[derive(Debug, Clone, Default)]
pub struct PitchAnalyzer {
    rules: PitchRules,
}

impl PitchAnalyzer {
    pub fn new(rules: PitchRules) -> Self {
        Self { rules }
    }

    /// Per-frame estimate in Hz; `None` for frames without a salient peak.
    pub fn track(&self, waveform: &Waveform) -> FrameSeries<Option<f64>> {
        magnitude_spectrogram(waveform.samples(), PITCH_LAYOUT)
            .map(|frame| self.frame_estimate(frame, PITCH_LAYOUT))
    }

    pub fn summarize(&self, estimates: &[f64]) -> PitchSummary {
        let (Some(mean_pitch), Some(pitch_std), Some(high), Some(low)) = (
            mean(estimates),
            std_dev(estimates),
            max_value(estimates),
            min_value(estimates),
        ) else {
            return PitchSummary::default();
        };
        let pitch_smoothness = steadiness(estimates);
        PitchSummary {
            mean_pitch,
            pitch_std,
            pitch_range: high - low,
            pitch_smoothness,
            voiced_frames: estimates.len(),
            score: self.sub_score(mean_pitch, pitch_std, pitch_smoothness),
        }
    }

    pub fn sub_score(&self, mean_pitch: f64, pitch_std: f64, smoothness: f64) -> f64 {
        let credit = self.rules.mean_band.credit(mean_pitch)
            + self.rules.spread_band.credit(pitch_std)
            + smoothness * self.rules.smoothness_weight;
        clamp_unit(credit.min(1.0))
    }

    fn frame_estimate(&self, magnitudes: &[f64], layout: FrameLayout) -> Option<f64> {
        if magnitudes.len() < 3 {
            return None;
        }
        let reference = magnitudes.iter().copied().fold(0.0, f64::max);
        if reference <= 0.0 {
            return None;
        }
        let threshold = reference * self.rules.peak_threshold;
        let bin_width = layout.bin_frequency(1.0);
        let first = ((self.rules.min_frequency_hz / bin_width).ceil() as usize).max(1);
        let end = ((self.rules.max_frequency_hz / bin_width).ceil() as usize)
            .min(magnitudes.len() - 1);

        let (bin, strength) = (first..end)
            .filter(|&bin| {
                let level = magnitudes[bin];
                level > threshold && level > magnitudes[bin - 1] && level >= magnitudes[bin + 1]
            })
            .map(|bin| (bin, magnitudes[bin]))
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        if strength <= 0.0 {
            return None;
        }

        let (left, centre, right) = (magnitudes[bin - 1], strength, magnitudes[bin + 1]);
        let curvature = 2.0 * centre - left - right;
        let shift = if curvature.abs() > f64::EPSILON {
            0.5 * (right - left) / curvature
        } else {
            0.0
        };
        let frequency = layout.bin_frequency(bin as f64 + shift);
        (frequency > 0.0).then_some(frequency)
    }
}

impl Analyzer for PitchAnalyzer {
    type Summary = PitchSummary;
    const NAME: &'static str = "pitch";

    fn analyze(&self, waveform: &Waveform) -> Result<PitchSummary> {
        let track = self.track(waveform);
        let estimates: Vec<f64> = track.iter().flatten().copied().collect();
        debug!(
            frames = track.len(),
            voiced = estimates.len(),
            "pitch tracking complete"
        );
        Ok(self.summarize(&estimates))
    }

    fn fallback(&self) -> PitchSummary {
        PitchSummary::default()
    }
}
