pub mod dtw;

use ndarray::Array2;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::AlignmentRules;
use crate::pronunciation::features::{CepstralFeatures, FeatureExtractor};
use crate::pronunciation::{PronunciationError, Result, Waveform};

pub use dtw::{dtw, DtwAlignment};

/// Similarity between a candidate recording and a reference recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentResult {
    pub dtw_distance: f64,
    pub dtw_normalized_distance: f64,
    pub dtw_path_length: usize,
    /// `100 * exp(-decay * distance)`, rounded to two decimals.
    pub dtw_score: f64,
    pub user_mfcc_shape: [usize; 2],
    pub ref_mfcc_shape: [usize; 2],
}

/// Compares a learner's recording against a reference by warping their
/// cepstral sequences onto each other.
#[derive(Debug, Clone, Default)]
pub struct ReferenceAligner {
    rules: AlignmentRules,
    extractor: FeatureExtractor,
}

impl ReferenceAligner {
    pub fn new(rules: AlignmentRules) -> Self {
        Self {
            rules,
            extractor: FeatureExtractor::new(),
        }
    }

    pub fn align(&self, candidate: &Waveform, reference: &Waveform) -> Result<AlignmentResult> {
        let candidate = self.features(candidate, "candidate")?;
        let reference = self.features(reference, "reference")?;
        self.align_features(&candidate.mfcc, &reference.mfcc)
    }

    pub fn align_features(
        &self,
        candidate: &Array2<f32>,
        reference: &Array2<f32>,
    ) -> Result<AlignmentResult> {
        if candidate.nrows() == 0 {
            return Err(PronunciationError::alignment("candidate MFCC sequence is empty"));
        }
        if reference.nrows() == 0 {
            return Err(PronunciationError::alignment("reference MFCC sequence is empty"));
        }
        let alignment = dtw(candidate.view(), reference.view())?;
        let result = AlignmentResult {
            dtw_distance: alignment.distance,
            dtw_normalized_distance: alignment.normalized_distance(),
            dtw_path_length: alignment.path.len(),
            dtw_score: self.similarity_score(alignment.distance),
            user_mfcc_shape: [candidate.nrows(), candidate.ncols()],
            ref_mfcc_shape: [reference.nrows(), reference.ncols()],
        };
        info!(
            distance = result.dtw_distance,
            score = result.dtw_score,
            path = result.dtw_path_length,
            "reference alignment complete"
        );
        Ok(result)
    }

    /// Maps a DTW distance onto `[0, 100]`; zero distance scores 100.
    pub fn similarity_score(&self, distance: f64) -> f64 {
        let score = 100.0 * (-self.rules.decay * distance.max(0.0)).exp();
        (score * 100.0).round() / 100.0
    }

    fn features(&self, waveform: &Waveform, label: &str) -> Result<CepstralFeatures> {
        let features = self.extractor.extract(waveform).map_err(|err| {
            PronunciationError::alignment(format!("{label} features unavailable: {err}"))
        })?;
        debug!(label, shape = ?features.shape(), "alignment features ready");
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;

    use super::*;
    use crate::pronunciation::ErrorKind;

    #[test]
    fn zero_distance_scores_one_hundred() {
        assert_eq!(ReferenceAligner::default().similarity_score(0.0), 100.0);
    }

    #[test]
    fn score_is_rounded_to_two_decimals() {
        let score = ReferenceAligner::default().similarity_score(10_000.0);
        // 100 * exp(-0.25) = 77.8800...
        assert_eq!(score, 77.88);
    }

    #[test]
    fn larger_distance_never_scores_higher() {
        let aligner = ReferenceAligner::default();
        assert!(aligner.similarity_score(500.0) >= aligner.similarity_score(5_000.0));
    }

    #[test]
    fn identical_features_align_perfectly() {
        let features = Array2::from_shape_fn((6, 13), |(i, j)| (i * j) as f32 * 0.1);
        let result = ReferenceAligner::default()
            .align_features(&features, &features)
            .unwrap();
        assert_eq!(result.dtw_distance, 0.0);
        assert_eq!(result.dtw_score, 100.0);
        assert_eq!(result.dtw_path_length, 6);
        assert_eq!(result.user_mfcc_shape, [6, 13]);
    }

    #[test]
    fn empty_reference_is_an_alignment_error() {
        let candidate = Array2::<f32>::zeros((4, 13));
        let reference = Array2::<f32>::zeros((0, 13));
        let err = ReferenceAligner::default()
            .align_features(&candidate, &reference)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Alignment);
        assert_eq!(err.message(), "reference MFCC sequence is empty");
    }

    #[test]
    fn result_uses_camel_case_keys() {
        let features = Array2::<f32>::zeros((2, 13));
        let result = ReferenceAligner::default()
            .align_features(&features, &features)
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["dtwScore"], 100.0);
        assert_eq!(json["refMfccShape"], serde_json::json!([2, 13]));
    }
}
