use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::audio::{decoder, resample};

use super::features::frames::{rms_envelope, FrameLayout};
use super::features::statistics::mean;
use super::{PronunciationError, Result};

/// Every analyzer works on audio at this rate.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Frame layout for RMS energy (and the stress envelope).
pub(crate) const ENERGY_LAYOUT: FrameLayout = FrameLayout::new(2048, 512, TARGET_SAMPLE_RATE);

/// Mono recording resampled to [`TARGET_SAMPLE_RATE`]. Immutable once built.
#[derive(Debug, Clone)]
pub struct Waveform {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl Waveform {
    /// Decode `path`, mix to mono and resample. Empty files are rejected.
    pub fn load(path: &Path) -> Result<Self> {
        let audio = decoder::decode_audio(path).map_err(|err| {
            warn!(path = %path.display(), error = %err, "failed to decode audio");
            PronunciationError::load(format!("{err:#}"))
        })?;
        if audio.samples.is_empty() {
            return Err(PronunciationError::load(format!(
                "audio file {} contains no samples",
                path.display()
            )));
        }
        debug!(
            source_rate = audio.sample_rate,
            duration_secs = audio.duration_secs(),
            "loaded audio"
        );
        Self::from_samples(audio.samples, audio.sample_rate)
    }

    /// Wrap in-memory samples, resampling them when `sample_rate` differs from the target.
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        let samples = if sample_rate == TARGET_SAMPLE_RATE {
            samples
        } else {
            resample::linear_resample(&samples, sample_rate, TARGET_SAMPLE_RATE).map_err(
                |err| {
                    PronunciationError::load(format!(
                        "failed to resample audio from {sample_rate} Hz to {TARGET_SAMPLE_RATE} Hz: {err}"
                    ))
                },
            )?
        };
        Ok(Self {
            samples: Arc::from(samples),
            sample_rate: TARGET_SAMPLE_RATE,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_secs())
    }

    /// Mean of the per-frame RMS amplitude.
    pub fn mean_energy(&self) -> f64 {
        let envelope = rms_envelope(&self.samples, ENERGY_LAYOUT);
        mean(envelope.values()).unwrap_or(0.0)
    }
}
