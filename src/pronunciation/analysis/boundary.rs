use ndarray::Array2;
use serde::Serialize;
use tracing::debug;

use crate::config::BoundaryRules;
use crate::pronunciation::features::statistics::{mean, std_dev};
use crate::pronunciation::features::FeatureExtractor;
use crate::pronunciation::{Result, Waveform};

use super::{clamp_unit, Analyzer, FeatureSummary};

/// Phoneme-boundary clarity measured from cepstral change between frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundarySummary {
    pub boundary_count: usize,
    /// Fraction of frame transitions marked as boundaries.
    pub boundary_quality: f64,
    /// Mean cepstral change per transition.
    pub change_intensity: f64,
    pub score: f64,
}

impl BoundarySummary {
    pub fn neutral(score: f64) -> Self {
        Self {
            boundary_count: 0,
            boundary_quality: 0.0,
            change_intensity: 0.0,
            score,
        }
    }
}

impl FeatureSummary for BoundarySummary {
    fn score(&self) -> f64 {
        self.score
    }
}

#[derive(Debug, Clone, Default)]
pub struct BoundaryAnalyzer {
    rules: BoundaryRules,
    extractor: FeatureExtractor,
}

impl BoundaryAnalyzer {
    pub fn new(rules: BoundaryRules) -> Self {
        Self {
            rules,
            extractor: FeatureExtractor::new(),
        }
    }

    /// Summed absolute coefficient change for each pair of adjacent frames.
    pub fn change_intensities(mfcc: &Array2<f32>) -> Vec<f64> {
        (1..mfcc.nrows())
            .map(|frame| {
                mfcc.row(frame)
                    .iter()
                    .zip(mfcc.row(frame - 1).iter())
                    .map(|(next, prev)| f64::from((next - prev).abs()))
                    .sum()
            })
            .collect()
    }

    pub fn summarize(&self, mfcc: &Array2<f32>) -> BoundarySummary {
        let intensities = Self::change_intensities(mfcc);
        let (Some(change_intensity), Some(spread)) = (mean(&intensities), std_dev(&intensities))
        else {
            return BoundarySummary::neutral(self.rules.fallback_score);
        };
        let cutoff = change_intensity + self.rules.std_multiplier * spread;
        let boundary_count = intensities
            .iter()
            .filter(|&&value| value > cutoff && value > self.rules.min_change_intensity)
            .count();
        let boundary_quality = boundary_count as f64 / intensities.len() as f64;
        BoundarySummary {
            boundary_count,
            boundary_quality,
            change_intensity,
            score: self.sub_score(boundary_count, boundary_quality),
        }
    }

    pub fn sub_score(&self, count: usize, quality: f64) -> f64 {
        if count == 0 {
            return self.rules.fallback_score;
        }
        let credit = quality * self.rules.quality_weight
            + count as f64 / self.rules.count_saturation * self.rules.count_weight;
        clamp_unit(credit.min(1.0))
    }
}

impl Analyzer for BoundaryAnalyzer {
    type Summary = BoundarySummary;
    const NAME: &'static str = "boundary";

    fn analyze(&self, waveform: &Waveform) -> Result<BoundarySummary> {
        let features = self.extractor.extract(waveform)?;
        let summary = self.summarize(&features.mfcc);
        debug!(
            frames = features.frame_count(),
            boundaries = summary.boundary_count,
            "boundary analysis complete"
        );
        Ok(summary)
    }

    fn fallback(&self) -> BoundarySummary {
        BoundarySummary::neutral(self.rules.fallback_score)
    }
}
