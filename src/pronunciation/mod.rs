pub mod alignment;
pub mod analysis;
pub mod cli;
pub mod detection;
pub mod features;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod waveform;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub use alignment::{AlignmentResult, ReferenceAligner};
pub use analysis::{
    Analyzer, AnalyzerOutcome, BoundaryAnalyzer, BoundarySummary, FeatureSummary,
    FormantAnalyzer, FormantSummary, PitchAnalyzer, PitchSummary, RhythmAnalyzer,
    RhythmSummary, StressPattern,
};
pub use detection::{ArticulationDetector, DetectionResult, Indicator};
pub use pipeline::{Assessment, Assessor};
pub use waveform::{Waveform, TARGET_SAMPLE_RATE};

/// Convenient alias for results returned by pronunciation modules.
pub type Result<T> = std::result::Result<T, PronunciationError>;

/// Which stage of the pipeline an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The audio resource could not be decoded or was empty.
    Load,
    /// A single analyzer failed; recovered with its fallback summary.
    Analyzer,
    /// A reference comparison received an empty feature sequence.
    Alignment,
    /// The rule table could not be loaded or failed validation.
    Config,
}

/// Error type shared by every stage of the pronunciation pipeline.
#[derive(Debug, Clone)]
pub struct PronunciationError {
    kind: ErrorKind,
    message: Arc<str>,
}

impl PronunciationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Arc::from(message.into()),
        }
    }

    pub fn load(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Load, message)
    }

    pub fn analyzer(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Analyzer, message)
    }

    pub fn alignment(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Alignment, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for PronunciationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for PronunciationError {}
