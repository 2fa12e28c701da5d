//! Full assessment of one recording: four analyzers in parallel, then the
//! articulation detector, the score calculator and feedback.

use std::path::Path;
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RuleTable;

use super::analysis::{
    self, fallback_outcome, Analyzer, AnalyzerOutcome, BoundaryAnalyzer, BoundarySummary,
    FeatureSummary, FormantAnalyzer, FormantSummary, PitchAnalyzer, PitchSummary,
    RhythmAnalyzer, RhythmSummary,
};
use super::detection::{ArticulationDetector, DetectionResult};
use super::metrics::{ScoreCalculator, SubScores};
use super::{Result, Waveform};

/// Everything reported for one recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub overall_score: f64,
    pub formant_analysis: FormantSummary,
    pub pitch_analysis: PitchSummary,
    pub rhythm_analysis: RhythmSummary,
    pub phoneme_analysis: BoundarySummary,
    pub katakana_detection: DetectionResult,
    pub energy_level: f64,
    /// Seconds.
    pub duration: f64,
    pub reference_text: String,
    pub detailed_feedback: Vec<String>,
    /// Analyzers whose fallback summary was substituted.
    #[serde(skip)]
    pub fallbacks: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct Assessor {
    pitch: PitchAnalyzer,
    formant: FormantAnalyzer,
    rhythm: RhythmAnalyzer,
    boundary: BoundaryAnalyzer,
    detector: ArticulationDetector,
    calculator: ScoreCalculator,
}

impl Default for Assessor {
    fn default() -> Self {
        Self::new(RuleTable::default())
    }
}

impl Assessor {
    pub fn new(rules: RuleTable) -> Self {
        Self {
            pitch: PitchAnalyzer::new(rules.pitch),
            formant: FormantAnalyzer::new(rules.formant),
            rhythm: RhythmAnalyzer::new(rules.rhythm),
            boundary: BoundaryAnalyzer::new(rules.boundary),
            detector: ArticulationDetector::new(rules.detector),
            calculator: ScoreCalculator::new(rules.scoring),
        }
    }

    /// Load `path` and assess it. Only loading can fail.
    pub fn assess_file(&self, path: &Path, reference_text: &str) -> Result<Assessment> {
        let waveform = Waveform::load(path)?;
        Ok(self.assess(&waveform, reference_text))
    }

    pub fn assess(&self, waveform: &Waveform, reference_text: &str) -> Assessment {
        let started = Instant::now();
        info!(
            samples = waveform.len(),
            duration_secs = waveform.duration_secs(),
            "starting assessment"
        );

        let (pitch, formant, rhythm, boundary, energy_level) = thread::scope(|scope| {
            let pitch = start(scope, &self.pitch, waveform);
            let formant = start(scope, &self.formant, waveform);
            let rhythm = start(scope, &self.rhythm, waveform);
            let boundary = start(scope, &self.boundary, waveform);
            let energy_level = waveform.mean_energy();
            (
                finish(&self.pitch, pitch),
                finish(&self.formant, formant),
                finish(&self.rhythm, rhythm),
                finish(&self.boundary, boundary),
                energy_level,
            )
        });

        let mut fallbacks = Vec::new();
        for (name, fell_back) in [
            (PitchAnalyzer::NAME, pitch.is_fallback()),
            (FormantAnalyzer::NAME, formant.is_fallback()),
            (RhythmAnalyzer::NAME, rhythm.is_fallback()),
            (BoundaryAnalyzer::NAME, boundary.is_fallback()),
        ] {
            if fell_back {
                fallbacks.push(name);
            }
        }

        let (pitch, formant, rhythm, boundary) = (
            pitch.into_summary(),
            formant.into_summary(),
            rhythm.into_summary(),
            boundary.into_summary(),
        );
        let detection = self.detector.detect(&pitch, &formant, &rhythm);
        let scores = SubScores {
            pitch: pitch.score(),
            formant: formant.score(),
            rhythm: rhythm.score(),
            boundary: boundary.score(),
            articulation_detected: detection.detected,
            energy: energy_level,
        };
        let overall_score = self.calculator.overall_score(&scores);
        let detailed_feedback = self.calculator.feedback(&scores);

        info!(
            overall_score,
            detected = detection.detected,
            ?fallbacks,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "assessment complete"
        );
        Assessment {
            overall_score,
            formant_analysis: formant,
            pitch_analysis: pitch,
            rhythm_analysis: rhythm,
            phoneme_analysis: boundary,
            katakana_detection: detection,
            energy_level,
            duration: waveform.duration_secs(),
            reference_text: reference_text.to_string(),
            detailed_feedback,
            fallbacks,
        }
    }
}

enum Pending<'scope, T> {
    Spawned(ScopedJoinHandle<'scope, AnalyzerOutcome<T>>),
    Done(AnalyzerOutcome<T>),
}

fn start<'scope, 'env, A: Analyzer>(
    scope: &'scope Scope<'scope, 'env>,
    analyzer: &'env A,
    waveform: &'env Waveform,
) -> Pending<'scope, A::Summary> {
    let spawned = thread::Builder::new()
        .name(format!("analyzer-{}", A::NAME))
        .spawn_scoped(scope, move || analysis::run(analyzer, waveform));
    match spawned {
        Ok(handle) => {
            debug!(analyzer = A::NAME, "analyzer thread spawned");
            Pending::Spawned(handle)
        }
        Err(err) => {
            warn!(analyzer = A::NAME, error = %err, "failed to spawn analyzer thread; running inline");
            Pending::Done(analysis::run(analyzer, waveform))
        }
    }
}

fn finish<A: Analyzer>(analyzer: &A, pending: Pending<'_, A::Summary>) -> AnalyzerOutcome<A::Summary> {
    match pending {
        Pending::Done(outcome) => outcome,
        Pending::Spawned(handle) => handle
            .join()
            .unwrap_or_else(|_| fallback_outcome(analyzer, "analyzer thread panicked".to_string())),
    }
}
