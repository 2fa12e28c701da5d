use std::f64::consts::PI;

use rustfft::{num_complex::Complex, FftPlanner};

use super::frames::{FrameLayout, FrameSeries};

/// Periodic Hann window.
fn hann_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / size as f64).cos())
        .collect()
}

/// Magnitude STFT: one `window / 2 + 1` bin spectrum per frame.
pub(crate) fn magnitude_spectrogram(samples: &[f32], layout: FrameLayout) -> FrameSeries<Vec<f64>> {
    let frame_count = layout.frame_count(samples.len());
    if frame_count == 0 {
        return FrameSeries::new(layout, Vec::new());
    }

    let window = hann_window(layout.window);
    let fft = FftPlanner::<f64>::new().plan_fft_forward(layout.window);
    let bins = layout.window / 2 + 1;
    let mut buffer = vec![Complex::new(0.0, 0.0); layout.window];
    let mut spectra = Vec::with_capacity(frame_count);

    for frame in layout.frames(samples) {
        for ((slot, &sample), &weight) in buffer.iter_mut().zip(frame.iter()).zip(window.iter()) {
            *slot = Complex::new(sample as f64 * weight, 0.0);
        }
        fft.process(&mut buffer);
        spectra.push(buffer[..bins].iter().map(|c| c.norm()).collect());
    }

    FrameSeries::new(layout, spectra)
}

/// L2 norm of the positive magnitude increase between consecutive frames.
/// The first frame has no predecessor and scores 0.
pub(crate) fn spectral_flux(spectra: &[Vec<f64>]) -> Vec<f64> {
    if spectra.is_empty() {
        return Vec::new();
    }
    let mut flux = Vec::with_capacity(spectra.len());
    flux.push(0.0);
    for pair in spectra.windows(2) {
        let rise: f64 = pair[1]
            .iter()
            .zip(pair[0].iter())
            .map(|(curr, prev)| (curr - prev).max(0.0).powi(2))
            .sum();
        flux.push(rise.sqrt());
    }
    flux
}

/// L2 norm of each frame's magnitudes.
pub(crate) fn frame_norms(spectra: &[Vec<f64>]) -> Vec<f64> {
    spectra
        .iter()
        .map(|frame| frame.iter().map(|m| m * m).sum::<f64>().sqrt())
        .collect()
}
