//! Independent per-recording analyzers.
//!
//! Each analyzer is a pure function of a [`Waveform`] that reduces it to a
//! serializable summary with a sub-score in `[0, 1]`. Failures never escape:
//! [`run`] turns them into [`AnalyzerOutcome::Fallback`] carrying the
//! analyzer's documented fallback summary.

pub mod boundary;
pub mod formant;
pub mod pitch;
pub mod rhythm;

use tracing::warn;

use super::{Result, Waveform};

pub use boundary::{BoundaryAnalyzer, BoundarySummary};
pub use formant::{FormantAnalyzer, FormantSummary};
pub use pitch::{PitchAnalyzer, PitchSummary};
pub use rhythm::{RhythmAnalyzer, RhythmSummary, StressPattern};

/// Uniform access to an analyzer summary's normalized sub-score.
pub trait FeatureSummary {
    fn score(&self) -> f64;
}

pub trait Analyzer: Sync {
    type Summary: FeatureSummary + Send + 'static;

    /// Stable name used in logs and thread names.
    const NAME: &'static str;

    fn analyze(&self, waveform: &Waveform) -> Result<Self::Summary>;

    /// Summary substituted when `analyze` fails.
    fn fallback(&self) -> Self::Summary;
}

/// Result of running one analyzer.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerOutcome<T> {
    Measured(T),
    Fallback { summary: T, reason: String },
}

impl<T> AnalyzerOutcome<T> {
    pub fn summary(&self) -> &T {
        match self {
            Self::Measured(summary) | Self::Fallback { summary, .. } => summary,
        }
    }

    pub fn into_summary(self) -> T {
        match self {
            Self::Measured(summary) | Self::Fallback { summary, .. } => summary,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Run `analyzer`, substituting its fallback summary on failure.
pub fn run<A: Analyzer>(analyzer: &A, waveform: &Waveform) -> AnalyzerOutcome<A::Summary> {
    match analyzer.analyze(waveform) {
        Ok(summary) => AnalyzerOutcome::Measured(summary),
        Err(err) => fallback_outcome(analyzer, err.to_string()),
    }
}

pub(crate) fn fallback_outcome<A: Analyzer>(
    analyzer: &A,
    reason: String,
) -> AnalyzerOutcome<A::Summary> {
    warn!(
        analyzer = A::NAME,
        reason = %reason,
        "analyzer failed; substituting fallback summary"
    );
    AnalyzerOutcome::Fallback {
        summary: analyzer.fallback(),
        reason,
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() || value <= 0.0 {
        0.0
    } else {
        value.min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pronunciation::{PronunciationError, TARGET_SAMPLE_RATE};

    struct Failing;

    #[derive(Debug, PartialEq)]
    struct Fixed(f64);

    impl FeatureSummary for Fixed {
        fn score(&self) -> f64 {
            self.0
        }
    }

    impl Analyzer for Failing {
        type Summary = Fixed;
        const NAME: &'static str = "failing";

        fn analyze(&self, _waveform: &Waveform) -> Result<Fixed> {
            Err(PronunciationError::analyzer("no data"))
        }

        fn fallback(&self) -> Fixed {
            Fixed(0.5)
        }
    }

    #[test]
    fn failure_substitutes_fallback() {
        let waveform = Waveform::from_samples(vec![0.0; 10], TARGET_SAMPLE_RATE).unwrap();
        let outcome = run(&Failing, &waveform);
        assert!(outcome.is_fallback());
        assert_eq!(outcome.summary().score(), 0.5);
        match outcome {
            AnalyzerOutcome::Fallback { reason, .. } => assert_eq!(reason, "no data"),
            AnalyzerOutcome::Measured(_) => unreachable!(),
        }
    }

    #[test]
    fn clamp_unit_handles_nan() {
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(-0.2), 0.0);
    }

    #[test]
    fn clamp_unit_drops_negative_zero() {
        assert!(clamp_unit(-0.0).is_sign_positive());
    }
}
