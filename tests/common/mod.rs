#![allow(dead_code)]

use std::f32::consts::PI;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use phonoscore::pronunciation::{Waveform, TARGET_SAMPLE_RATE};

pub const SAMPLE_RATE: u32 = TARGET_SAMPLE_RATE;

pub fn sine_wave(freq: f32, seconds: f32, amplitude: f32) -> Vec<f32> {
    let len = (seconds * SAMPLE_RATE as f32) as usize;
    (0..len)
        .map(|i| amplitude * (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
        .collect()
}

/// Tone whose frequency swings sinusoidally between `low` and `high`.
pub fn vibrato(low: f32, high: f32, rate_hz: f32, seconds: f32) -> Vec<f32> {
    let len = (seconds * SAMPLE_RATE as f32) as usize;
    let centre = (low + high) / 2.0;
    let depth = (high - low) / 2.0;
    let mut phase = 0.0f32;
    (0..len)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let freq = centre + depth * (2.0 * PI * rate_hz * t).sin();
            phase = (phase + 2.0 * PI * freq / SAMPLE_RATE as f32) % (2.0 * PI);
            0.5 * phase.sin()
        })
        .collect()
}

/// Short tone bursts separated by silence, one every `period` seconds.
pub fn tone_bursts(freq: f32, period: f32, burst: f32, seconds: f32) -> Vec<f32> {
    let tone = sine_wave(freq, seconds, 0.5);
    tone.into_iter()
        .enumerate()
        .map(|(i, sample)| {
            let t = i as f32 / SAMPLE_RATE as f32;
            if t % period < burst {
                sample
            } else {
                0.0
            }
        })
        .collect()
}

pub fn waveform(samples: Vec<f32>) -> Waveform {
    Waveform::from_samples(samples, SAMPLE_RATE).expect("in-memory waveform")
}

pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32, channels: u16) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).expect("create wav");
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(value).expect("write sample");
        }
    }
    writer.finalize().expect("finalize wav");
}
