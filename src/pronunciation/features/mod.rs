pub mod frames;
pub(crate) mod mel;
pub(crate) mod peaks;
pub(crate) mod statistics;
pub(crate) mod stft;

use ndarray::Array2;
use tracing::debug;

pub use frames::{FrameLayout, FrameSeries};
pub use mel::MFCC_COUNT;

use crate::pronunciation::{PronunciationError, Result, Waveform};

/// Cepstral feature sequence: one `MFCC_COUNT`-wide row per frame.
#[derive(Debug, Clone)]
pub struct CepstralFeatures {
    pub layout: FrameLayout,
    pub mfcc: Array2<f32>,
}

impl CepstralFeatures {
    pub fn frame_count(&self) -> usize {
        self.mfcc.nrows()
    }

    /// `[frames, coefficients]`.
    pub fn shape(&self) -> [usize; 2] {
        [self.mfcc.nrows(), self.mfcc.ncols()]
    }

    pub fn is_empty(&self) -> bool {
        self.mfcc.nrows() == 0
    }
}

/// Responsible for preparing cepstral features from a waveform.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extract(&self, waveform: &Waveform) -> Result<CepstralFeatures> {
        let mfcc = mel::mfcc_matrix(waveform.samples())
            .map_err(|err| PronunciationError::analyzer(format!("MFCC extraction failed: {err:#}")))?;
        debug!(frames = mfcc.nrows(), "extracted cepstral features");
        Ok(CepstralFeatures {
            layout: mel::cepstral_layout(),
            mfcc,
        })
    }
}
