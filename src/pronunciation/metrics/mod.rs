use crate::config::ScoringRules;

pub const ARTICULATION_FEEDBACK: &str =
    "Avoid katakana-style pronunciation; aim for native-like articulation.";
pub const PITCH_FEEDBACK: &str = "Make your intonation more natural.";
pub const RHYTHM_FEEDBACK: &str = "Make your rhythm more natural.";
pub const BOUNDARY_FEEDBACK: &str = "Articulate the transitions between sounds more clearly.";
pub const VOWEL_FEEDBACK: &str = "Pronounce vowels more accurately.";
pub const PRAISE_FEEDBACK: &str = "Excellent pronunciation!";

/// Everything the overall score and feedback depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubScores {
    pub pitch: f64,
    pub formant: f64,
    pub rhythm: f64,
    pub boundary: f64,
    pub articulation_detected: bool,
    pub energy: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ScoreCalculator {
    rules: ScoringRules,
}

impl ScoreCalculator {
    pub fn new(rules: ScoringRules) -> Self {
        Self { rules }
    }

    /// Base score plus every adjustment, clamped to `[0, 100]`.
    pub fn overall_score(&self, scores: &SubScores) -> f64 {
        let total = self.rules.base_score + self.adjustments(scores).iter().sum::<f64>();
        if total.is_nan() {
            0.0
        } else {
            total.clamp(0.0, 100.0)
        }
    }

    /// Pitch, rhythm, boundary, articulation and energy adjustments, in order.
    pub fn adjustments(&self, scores: &SubScores) -> [f64; 5] {
        let articulation = if scores.articulation_detected {
            self.rules.articulation_penalty
        } else {
            self.rules.articulation_bonus
        };
        [
            self.rules.pitch.apply(scores.pitch),
            self.rules.rhythm.apply(scores.rhythm),
            self.rules.boundary.apply(scores.boundary),
            articulation,
            self.rules.energy.apply(scores.energy),
        ]
    }

    pub fn feedback(&self, scores: &SubScores) -> Vec<String> {
        let weak = |score: f64| score < self.rules.feedback_threshold;
        let mut messages = Vec::new();
        if scores.articulation_detected {
            messages.push(ARTICULATION_FEEDBACK);
        }
        if weak(scores.pitch) {
            messages.push(PITCH_FEEDBACK);
        }
        if weak(scores.rhythm) {
            messages.push(RHYTHM_FEEDBACK);
        }
        if weak(scores.boundary) {
            messages.push(BOUNDARY_FEEDBACK);
        }
        if weak(scores.formant) {
            messages.push(VOWEL_FEEDBACK);
        }
        if messages.is_empty() {
            messages.push(PRAISE_FEEDBACK);
        }
        messages.into_iter().map(str::to_string).collect()
    }
}
