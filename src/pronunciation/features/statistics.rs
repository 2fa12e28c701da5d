use anyhow::{ensure, Context, Result};
use ndarray::Array2;

/// Copy a row-major `Vec<Vec<f64>>` into an `f32` matrix.
pub(crate) fn array_from_vec2(data: &[Vec<f64>]) -> Result<Array2<f32>> {
    if data.is_empty() {
        return Ok(Array2::zeros((0, 0)));
    }
    let rows = data.len();
    let cols = data[0].len();
    ensure!(
        data.iter().all(|row| row.len() == cols),
        "ragged feature matrix: expected {cols} columns in every row"
    );
    let flat: Vec<f32> = data.iter().flatten().map(|&v| v as f32).collect();
    Array2::from_shape_vec((rows, cols), flat).context("invalid feature matrix dimensions")
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation.
pub(crate) fn std_dev(values: &[f64]) -> Option<f64> {
    let centre = mean(values)?;
    let variance =
        values.iter().map(|v| (v - centre).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

pub(crate) fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

/// `1 / (1 + std)` of the consecutive differences; 0 for fewer than two values.
pub(crate) fn steadiness(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    std_dev(&diff(values)).map_or(0.0, |spread| 1.0 / (1.0 + spread))
}

pub(crate) fn max_value(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

pub(crate) fn min_value(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}
