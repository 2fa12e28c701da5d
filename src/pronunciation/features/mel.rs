use anyhow::Result;
use aus::analysis;
use aus::analysis::mel::MelFilterbank;
use aus::spectrum;
use aus::WindowType;
use ndarray::Array2;

use crate::pronunciation::waveform::TARGET_SAMPLE_RATE;

use super::frames::FrameLayout;
use super::statistics::array_from_vec2;

pub(crate) const WINDOW_MS: usize = 25;
pub(crate) const HOP_MS: usize = 10;
pub(crate) const MEL_BANDS: usize = 80;
pub const MFCC_COUNT: usize = 13;
const MIN_FREQ: f64 = 20.0;
/// Keeps the log inside the cepstrum finite on silent frames.
const MEL_FLOOR: f64 = 1e-10;

pub(crate) fn cepstral_layout() -> FrameLayout {
    let window = ((TARGET_SAMPLE_RATE as usize * WINDOW_MS) / 1000).max(1);
    let hop = ((TARGET_SAMPLE_RATE as usize * HOP_MS) / 1000).max(1);
    FrameLayout::new(window, hop, TARGET_SAMPLE_RATE)
}

/// 13-coefficient MFCC matrix, one row per 25 ms frame.
pub(crate) fn mfcc_matrix(samples: &[f32]) -> Result<Array2<f32>> {
    let layout = cepstral_layout();
    let Some(framed) = whole_window_span(samples, layout) else {
        return Ok(Array2::zeros((0, MFCC_COUNT)));
    };

    let stft = spectrum::rstft(&framed, layout.window, layout.hop, WindowType::Hanning);
    let (magnitude, _) = spectrum::complex_to_polar_rstft(&stft);
    let power = analysis::make_power_spectrogram(&magnitude);
    let freqs = spectrum::rfftfreq(layout.window, TARGET_SAMPLE_RATE);
    let filterbank = MelFilterbank::new(
        MIN_FREQ,
        (TARGET_SAMPLE_RATE as f64) / 2.0,
        MEL_BANDS,
        &freqs,
        true,
    );
    let mut mel = analysis::mel::make_mel_spectrogram(&power, &filterbank);
    for frame in mel.iter_mut() {
        for value in frame.iter_mut() {
            if !value.is_finite() || *value < MEL_FLOOR {
                *value = MEL_FLOOR;
            }
        }
    }

    let mfcc = analysis::mel::mfcc_spectrogram(&mel, MFCC_COUNT, None);
    array_from_vec2(&mfcc)
}

/// Samples covering exactly the layout's frames: the tail past the last whole
/// window is dropped, and a clip shorter than one window is zero-padded to it.
fn whole_window_span(samples: &[f32], layout: FrameLayout) -> Option<Vec<f64>> {
    let frames = layout.frame_count(samples.len());
    if frames == 0 {
        return None;
    }
    let span = (frames - 1) * layout.hop + layout.window;
    let mut framed: Vec<f64> = samples.iter().take(span).map(|&s| f64::from(s)).collect();
    framed.resize(span, 0.0);
    Some(framed)
}

#[cfg(test)]
mod tests {
    use super::{cepstral_layout, mfcc_matrix, whole_window_span, MFCC_COUNT};

    #[test]
    fn layout_is_25ms_by_10ms() {
        let layout = cepstral_layout();
        assert_eq!((layout.window, layout.hop), (400, 160));
    }

    #[test]
    fn empty_input_gives_empty_matrix() {
        let mfcc = mfcc_matrix(&[]).unwrap();
        assert_eq!(mfcc.dim(), (0, MFCC_COUNT));
    }

    #[test]
    fn silence_yields_finite_coefficients() {
        let mfcc = mfcc_matrix(&[0.0; 8000]).unwrap();
        assert_eq!(mfcc.nrows(), cepstral_layout().frame_count(8000));
        assert!(mfcc.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn span_drops_partial_tail_and_pads_short_clips() {
        let layout = cepstral_layout();
        assert_eq!(whole_window_span(&[0.1; 8100], layout).map(|s| s.len()), Some(8080));
        assert_eq!(whole_window_span(&[0.1; 100], layout).map(|s| s.len()), Some(400));
        assert!(whole_window_span(&[], layout).is_none());
    }

    #[test]
    fn short_clip_gives_one_frame() {
        let mfcc = mfcc_matrix(&[0.2; 100]).unwrap();
        assert_eq!(mfcc.dim(), (1, MFCC_COUNT));
    }
}
