use anyhow::{ensure, Result};

/// Resample `samples` from `source_rate` to `target_rate` by linear interpolation.
///
/// The output covers the same duration as the input: `ceil(len * target / source)`
/// samples, with the final positions clamped to the last input sample.
pub fn linear_resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    ensure!(source_rate > 0, "source sample rate must be positive");
    ensure!(target_rate > 0, "target sample rate must be positive");
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples.to_vec());
    }
    let step = source_rate as f64 / target_rate as f64;
    let output_len = (samples.len() as f64 / step).ceil().max(1.0) as usize;
    let last = samples.len() - 1;
    let resampled = (0..output_len)
        .map(|index| {
            let position = index as f64 * step;
            let left = (position.floor() as usize).min(last);
            let right = (left + 1).min(last);
            let weight = (position - left as f64).clamp(0.0, 1.0) as f32;
            samples[left] + (samples[right] - samples[left]) * weight
        })
        .collect();
    Ok(resampled)
}

#[cfg(test)]
mod tests {
    use super::linear_resample;

    #[test]
    fn downsampling_keeps_constant_level_and_duration() {
        let input = vec![0.5; 480];
        let resampled = linear_resample(&input, 48_000, 16_000).unwrap();
        assert_eq!(resampled.len(), 160);
        assert!(resampled.iter().all(|&sample| (sample - 0.5).abs() < 1e-6));
    }

    #[test]
    fn upsampling_interpolates_between_neighbours() {
        let resampled = linear_resample(&[0.0, 1.0], 8_000, 16_000).unwrap();
        assert_eq!(resampled.len(), 4);
        assert!((resampled[1] - 0.5).abs() < 1e-6);
        assert!((resampled[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_zero_rates() {
        assert!(linear_resample(&[0.1], 0, 16_000).is_err());
        assert!(linear_resample(&[0.1], 16_000, 0).is_err());
    }
}
