//! Rule tables driving every heuristic threshold in the scoring pipeline.
//!
//! `RuleTable::default()` holds the tuned values the scorer ships with. A JSON
//! file can override any subset of them; missing fields keep their defaults.

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// Sub-score awarded by the formant analyzer when no frame yields two peaks.
pub const FORMANT_FALLBACK_SCORE: f64 = 0.6;
/// Sub-score awarded by the boundary analyzer when no boundary is found.
pub const BOUNDARY_FALLBACK_SCORE: f64 = 0.5;
/// Decay constant mapping DTW distance onto a 0-100 similarity score.
pub const DTW_DECAY: f64 = 2.5e-5;

/// Inclusive frequency (or tempo) band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }

    fn validate(&self, label: &str) -> Result<()> {
        ensure!(
            self.low.is_finite() && self.high.is_finite(),
            "{label} band must be finite"
        );
        ensure!(self.low <= self.high, "{label} band low exceeds high");
        Ok(())
    }
}

/// Preferred band with a wider fallback band worth less credit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TieredBand {
    pub preferred: Band,
    pub preferred_credit: f64,
    pub fallback: Band,
    pub fallback_credit: f64,
}

impl TieredBand {
    pub fn credit(&self, value: f64) -> f64 {
        if self.preferred.contains(value) {
            self.preferred_credit
        } else if self.fallback.contains(value) {
            self.fallback_credit
        } else {
            0.0
        }
    }

    fn validate(&self, label: &str) -> Result<()> {
        self.preferred.validate(label)?;
        self.fallback.validate(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchRules {
    /// Lowest bin centre frequency considered a pitch candidate.
    pub min_frequency_hz: f64,
    /// Bins at or above this frequency are ignored.
    pub max_frequency_hz: f64,
    /// Candidate peaks must exceed this fraction of the frame maximum.
    pub peak_threshold: f64,
    pub mean_band: TieredBand,
    pub spread_band: TieredBand,
    pub smoothness_weight: f64,
}

impl Default for PitchRules {
    fn default() -> Self {
        Self {
            min_frequency_hz: 60.0,
            max_frequency_hz: 1000.0,
            peak_threshold: 0.1,
            mean_band: TieredBand {
                preferred: Band::new(80.0, 600.0),
                preferred_credit: 0.5,
                fallback: Band::new(60.0, 700.0),
                fallback_credit: 0.3,
            },
            spread_band: TieredBand {
                preferred: Band::new(10.0, 200.0),
                preferred_credit: 0.3,
                fallback: Band::new(5.0, 300.0),
                fallback_credit: 0.2,
            },
            smoothness_weight: 0.2,
        }
    }
}

/// Resonance rectangle for one reference vowel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VowelBand {
    pub vowel: String,
    pub f1: Band,
    pub f2: Band,
}

impl VowelBand {
    fn new(vowel: &str, f1: (f64, f64), f2: (f64, f64)) -> Self {
        Self {
            vowel: vowel.to_string(),
            f1: Band::new(f1.0, f1.1),
            f2: Band::new(f2.0, f2.1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormantRules {
    /// Analyze every n-th spectrogram frame.
    pub frame_stride: usize,
    /// Peaks must exceed this fraction of the frame maximum.
    pub peak_threshold: f64,
    pub f1_credit: f64,
    pub f2_credit: f64,
    pub fallback_score: f64,
    pub vowels: Vec<VowelBand>,
}

impl Default for FormantRules {
    fn default() -> Self {
        Self {
            frame_stride: 5,
            peak_threshold: 0.05,
            f1_credit: 0.5,
            f2_credit: 0.4,
            fallback_score: FORMANT_FALLBACK_SCORE,
            vowels: vec![
                VowelBand::new("i", (200.0, 900.0), (1500.0, 3500.0)),
                VowelBand::new("ɪ", (300.0, 1000.0), (1600.0, 3200.0)),
                VowelBand::new("e", (400.0, 1100.0), (1400.0, 3000.0)),
                VowelBand::new("æ", (500.0, 1300.0), (1200.0, 2800.0)),
                VowelBand::new("ɑ", (600.0, 1200.0), (1000.0, 2600.0)),
                VowelBand::new("ʌ", (300.0, 900.0), (1100.0, 2400.0)),
                VowelBand::new("u", (200.0, 800.0), (900.0, 2200.0)),
                VowelBand::new("ʊ", (300.0, 900.0), (1000.0, 2400.0)),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmRules {
    /// Minimum normalized spectral flux for an onset.
    pub onset_threshold: f64,
    pub min_onset_gap_ms: f64,
    pub min_bpm: f64,
    pub max_bpm: f64,
    pub prior_bpm: f64,
    /// Standard deviation of the tempo prior, in octaves.
    pub prior_octaves: f64,
    pub tempo_band: TieredBand,
    pub consistency_weight: f64,
    /// Envelope peaks above this multiple of the mean mark natural stress.
    pub stress_peak_ratio: f64,
    pub natural_stress_credit: f64,
    pub flat_stress_credit: f64,
}

impl Default for RhythmRules {
    fn default() -> Self {
        Self {
            onset_threshold: 0.2,
            min_onset_gap_ms: 50.0,
            min_bpm: 30.0,
            max_bpm: 300.0,
            prior_bpm: 120.0,
            prior_octaves: 1.0,
            tempo_band: TieredBand {
                preferred: Band::new(40.0, 200.0),
                preferred_credit: 0.5,
                fallback: Band::new(30.0, 250.0),
                fallback_credit: 0.3,
            },
            consistency_weight: 0.3,
            stress_peak_ratio: 1.2,
            natural_stress_credit: 0.2,
            flat_stress_credit: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryRules {
    /// Boundaries need intensity above mean + `std_multiplier` * std.
    pub std_multiplier: f64,
    /// Intensities at or below this never count as boundaries.
    pub min_change_intensity: f64,
    pub quality_weight: f64,
    pub count_weight: f64,
    pub count_saturation: f64,
    pub fallback_score: f64,
}

impl Default for BoundaryRules {
    fn default() -> Self {
        Self {
            std_multiplier: 1.0,
            min_change_intensity: 1e-3,
            quality_weight: 0.6,
            count_weight: 0.4,
            count_saturation: 15.0,
            fallback_score: BOUNDARY_FALLBACK_SCORE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorRules {
    pub monotone_pitch_range_hz: f64,
    pub monotone_weight: f64,
    /// 100 FFT bins at 1024 points / 16 kHz, expressed in Hz.
    pub unstable_formant_spread_hz: f64,
    pub unstable_formant_weight: f64,
    pub min_rhythm_consistency: f64,
    pub unnatural_rhythm_weight: f64,
    /// Detection requires confidence strictly above this value.
    pub detection_threshold: f64,
}

impl Default for DetectorRules {
    fn default() -> Self {
        Self {
            monotone_pitch_range_hz: 50.0,
            monotone_weight: 0.3,
            unstable_formant_spread_hz: 1562.5,
            unstable_formant_weight: 0.3,
            min_rhythm_consistency: 0.3,
            unnatural_rhythm_weight: 0.4,
            detection_threshold: 0.5,
        }
    }
}

/// Two-step threshold adjustment: `high_bonus` above `high`, `mid_bonus`
/// above `mid`, `penalty` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub high: f64,
    pub high_bonus: f64,
    pub mid: f64,
    pub mid_bonus: f64,
    pub penalty: f64,
}

impl Adjustment {
    pub fn apply(&self, value: f64) -> f64 {
        if value > self.high {
            self.high_bonus
        } else if value > self.mid {
            self.mid_bonus
        } else {
            self.penalty
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub base_score: f64,
    pub pitch: Adjustment,
    pub rhythm: Adjustment,
    pub boundary: Adjustment,
    pub energy: Adjustment,
    pub articulation_penalty: f64,
    pub articulation_bonus: f64,
    /// Sub-scores below this value produce a feedback sentence.
    pub feedback_threshold: f64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            base_score: 75.0,
            pitch: Adjustment {
                high: 0.7,
                high_bonus: 10.0,
                mid: 0.5,
                mid_bonus: 5.0,
                penalty: -5.0,
            },
            rhythm: Adjustment {
                high: 0.8,
                high_bonus: 10.0,
                mid: 0.6,
                mid_bonus: 5.0,
                penalty: -5.0,
            },
            boundary: Adjustment {
                high: 0.5,
                high_bonus: 5.0,
                mid: 0.5,
                mid_bonus: 5.0,
                penalty: -3.0,
            },
            energy: Adjustment {
                high: 0.1,
                high_bonus: 5.0,
                mid: 0.05,
                mid_bonus: 0.0,
                penalty: -5.0,
            },
            articulation_penalty: -20.0,
            articulation_bonus: 10.0,
            feedback_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentRules {
    pub decay: f64,
}

impl Default for AlignmentRules {
    fn default() -> Self {
        Self { decay: DTW_DECAY }
    }
}

/// Every tunable threshold of the pipeline, grouped per stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTable {
    pub pitch: PitchRules,
    pub formant: FormantRules,
    pub rhythm: RhythmRules,
    pub boundary: BoundaryRules,
    pub detector: DetectorRules,
    pub scoring: ScoringRules,
    pub alignment: AlignmentRules,
}

impl RuleTable {
    /// Load overrides from a JSON file; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read rule table {:?}", path))?;
        let rules: RuleTable = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse rule table {:?}", path))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Resolve the optional `--rules` override into a validated table.
    pub fn from_override(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(custom) => Self::load(custom),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.pitch.min_frequency_hz > 0.0
                && self.pitch.min_frequency_hz < self.pitch.max_frequency_hz,
            "pitch frequency limits must satisfy 0 < min < max"
        );
        self.pitch.mean_band.validate("pitch mean")?;
        self.pitch.spread_band.validate("pitch spread")?;
        ensure!(
            self.formant.frame_stride > 0,
            "formant frame_stride must be positive"
        );
        for vowel in &self.formant.vowels {
            vowel.f1.validate(&format!("vowel {} F1", vowel.vowel))?;
            vowel.f2.validate(&format!("vowel {} F2", vowel.vowel))?;
        }
        ensure!(
            self.rhythm.min_bpm > 0.0 && self.rhythm.min_bpm < self.rhythm.max_bpm,
            "rhythm tempo search range must satisfy 0 < min_bpm < max_bpm"
        );
        ensure!(
            self.rhythm.prior_bpm > 0.0 && self.rhythm.prior_octaves > 0.0,
            "rhythm tempo prior must be positive"
        );
        self.rhythm.tempo_band.validate("rhythm tempo")?;
        ensure!(
            self.boundary.count_saturation > 0.0,
            "boundary count_saturation must be positive"
        );
        ensure!(
            self.alignment.decay.is_finite() && self.alignment.decay >= 0.0,
            "alignment decay must be a non-negative number"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{Band, RuleTable, BOUNDARY_FALLBACK_SCORE, FORMANT_FALLBACK_SCORE};

    #[test]
    fn defaults_are_valid() {
        let rules = RuleTable::default();
        rules.validate().unwrap();
        assert_eq!(rules.formant.fallback_score, FORMANT_FALLBACK_SCORE);
        assert_eq!(rules.boundary.fallback_score, BOUNDARY_FALLBACK_SCORE);
        assert_eq!(rules.formant.vowels.len(), 8);
    }

    #[test]
    fn canonical_detector_weights_sum_to_one() {
        let detector = RuleTable::default().detector;
        let total =
            detector.monotone_weight + detector.unstable_formant_weight + detector.unnatural_rhythm_weight;
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"scoring": {{"base_score": 70.0}}}}"#).unwrap();
        let rules = RuleTable::load(file.path()).unwrap();
        assert_eq!(rules.scoring.base_score, 70.0);
        assert_eq!(rules.scoring.articulation_penalty, -20.0);
        assert_eq!(rules.pitch, RuleTable::default().pitch);
    }

    #[test]
    fn rejects_inverted_band() {
        let mut rules = RuleTable::default();
        rules.pitch.mean_band.preferred = Band::new(600.0, 80.0);
        assert!(rules.validate().is_err());
    }

    #[test]
    fn missing_override_falls_back_to_defaults() {
        let rules = RuleTable::from_override(None).unwrap();
        assert_eq!(rules, RuleTable::default());
    }
}
