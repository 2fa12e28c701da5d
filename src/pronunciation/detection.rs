//! Non-native ("katakana-style") articulation detection.
//!
//! Three indicators are read off the analyzer summaries. Each contributes a
//! fixed weight to the confidence; the pattern counts as detected only when
//! the confidence strictly exceeds the detection threshold.

use serde::Serialize;
use tracing::debug;

use crate::config::DetectorRules;

use super::analysis::{clamp_unit, FormantSummary, PitchSummary, RhythmSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    MonotonePitch,
    UnstableFormants,
    UnnaturalRhythm,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    pub detected: bool,
    pub confidence: f64,
    pub indicators: Vec<Indicator>,
    /// `1 - confidence`; higher means more native-like.
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ArticulationDetector {
    rules: DetectorRules,
}

impl ArticulationDetector {
    pub fn new(rules: DetectorRules) -> Self {
        Self { rules }
    }

    pub fn detect(
        &self,
        pitch: &PitchSummary,
        formant: &FormantSummary,
        rhythm: &RhythmSummary,
    ) -> DetectionResult {
        let mut indicators = Vec::new();
        if pitch.pitch_range < self.rules.monotone_pitch_range_hz {
            indicators.push(Indicator::MonotonePitch);
        }
        if formant.formant_stability > self.rules.unstable_formant_spread_hz {
            indicators.push(Indicator::UnstableFormants);
        }
        if rhythm.rhythm_consistency < self.rules.min_rhythm_consistency {
            indicators.push(Indicator::UnnaturalRhythm);
        }

        let confidence = self.confidence_for(&indicators);
        let detected = confidence > self.rules.detection_threshold;
        debug!(?indicators, confidence, detected, "articulation check");
        DetectionResult {
            detected,
            confidence,
            indicators,
            score: 1.0 - confidence,
        }
    }

    /// Sum of indicator weights, clamped to `[0, 1]`.
    pub fn confidence_for(&self, indicators: &[Indicator]) -> f64 {
        let total: f64 = indicators
            .iter()
            .map(|indicator| match indicator {
                Indicator::MonotonePitch => self.rules.monotone_weight,
                Indicator::UnstableFormants => self.rules.unstable_formant_weight,
                Indicator::UnnaturalRhythm => self.rules.unnatural_rhythm_weight,
            })
            .fold(0.0, |acc, weight| acc + weight);
        clamp_unit(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pronunciation::StressPattern;

    fn pitch(range: f64) -> PitchSummary {
        PitchSummary {
            pitch_range: range,
            ..PitchSummary::default()
        }
    }

    fn formant(stability: f64) -> FormantSummary {
        FormantSummary {
            formant_stability: stability,
            ..FormantSummary::neutral(0.6)
        }
    }

    fn rhythm(consistency: f64) -> RhythmSummary {
        RhythmSummary {
            rhythm_consistency: consistency,
            stress_pattern: StressPattern::Natural,
            ..RhythmSummary::default()
        }
    }

    #[test]
    fn native_like_input_raises_nothing() {
        let result = ArticulationDetector::default().detect(&pitch(120.0), &formant(300.0), &rhythm(0.8));
        assert!(result.indicators.is_empty());
        assert!(!result.detected);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn native_like_confidence_serializes_as_positive_zero() {
        let result = ArticulationDetector::default().detect(&pitch(120.0), &formant(300.0), &rhythm(0.9));
        assert!(result.confidence.is_sign_positive());
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("-0.0"), "{json}");
        assert!(json.contains("\"confidence\":0.0"), "{json}");
    }

    #[test]
    fn monotone_and_arrhythmic_is_detected() {
        let result = ArticulationDetector::default().detect(&pitch(10.0), &formant(300.0), &rhythm(0.1));
        assert_eq!(
            result.indicators,
            vec![Indicator::MonotonePitch, Indicator::UnnaturalRhythm]
        );
        assert!((result.confidence - 0.7).abs() < 1e-12);
        assert!(result.detected);
        assert!((result.score - 0.3).abs() < 1e-12);
    }

    #[test]
    fn single_indicator_is_not_enough() {
        let result = ArticulationDetector::default().detect(&pitch(120.0), &formant(2000.0), &rhythm(0.8));
        assert_eq!(result.indicators, vec![Indicator::UnstableFormants]);
        assert!(!result.detected);
    }

    #[test]
    fn confidence_exactly_at_threshold_is_not_detected() {
        let rules = DetectorRules {
            unnatural_rhythm_weight: 0.5,
            ..DetectorRules::default()
        };
        let result = ArticulationDetector::new(rules).detect(&pitch(120.0), &formant(300.0), &rhythm(0.0));
        assert_eq!(result.confidence, 0.5);
        assert!(!result.detected);
    }

    #[test]
    fn confidence_is_clamped() {
        let rules = DetectorRules {
            monotone_weight: 0.9,
            unnatural_rhythm_weight: 0.9,
            ..DetectorRules::default()
        };
        let detector = ArticulationDetector::new(rules);
        let all = [
            Indicator::MonotonePitch,
            Indicator::UnstableFormants,
            Indicator::UnnaturalRhythm,
        ];
        assert_eq!(detector.confidence_for(&all), 1.0);
    }

    #[test]
    fn indicators_serialize_in_snake_case() {
        let json = serde_json::to_string(&Indicator::UnstableFormants).unwrap();
        assert_eq!(json, "\"unstable_formants\"");
    }
}
