use ndarray::ArrayView2;

use crate::pronunciation::{PronunciationError, Result};

/// Outcome of warping one feature sequence onto another.
#[derive(Debug, Clone, PartialEq)]
pub struct DtwAlignment {
    /// Accumulated cost at the final cell.
    pub distance: f64,
    /// Warping path from `(0, 0)` to `(n - 1, m - 1)`, inclusive.
    pub path: Vec<(usize, usize)>,
}

impl DtwAlignment {
    /// Distance divided by `n + m`, the symmetric step pattern's normalizer.
    pub fn normalized_distance(&self) -> f64 {
        match (self.path.first(), self.path.last()) {
            (Some(_), Some(&(i, j))) => self.distance / (i + j + 2) as f64,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Start,
    Diagonal,
    Down,
    Right,
}

/// Dynamic time warping with Euclidean frame distance and the symmetric
/// step pattern: horizontal and vertical moves cost `d`, diagonal moves `2d`.
pub fn dtw(candidate: ArrayView2<'_, f32>, reference: ArrayView2<'_, f32>) -> Result<DtwAlignment> {
    ensure_inputs(&candidate, &reference)?;
    let (rows, cols) = (candidate.nrows(), reference.nrows());
    let mut cost = vec![vec![f64::INFINITY; cols]; rows];
    let mut steps = vec![vec![Step::Start; cols]; rows];
    fill_tables(&mut cost, &mut steps, &candidate, &reference);

    let distance = cost[rows - 1][cols - 1];
    if !distance.is_finite() {
        return Err(PronunciationError::alignment(
            "failed to compute finite DTW alignment cost",
        ));
    }
    let path = backtrack_path(&steps, rows, cols)?;
    Ok(DtwAlignment { distance, path })
}

fn ensure_inputs(candidate: &ArrayView2<'_, f32>, reference: &ArrayView2<'_, f32>) -> Result<()> {
    if candidate.nrows() == 0 || reference.nrows() == 0 {
        return Err(PronunciationError::alignment(
            "feature sequences must contain at least one frame",
        ));
    }
    if candidate.ncols() != reference.ncols() {
        return Err(PronunciationError::alignment(format!(
            "feature width mismatch: {} vs {} coefficients",
            candidate.ncols(),
            reference.ncols()
        )));
    }
    Ok(())
}

fn fill_tables(
    cost: &mut [Vec<f64>],
    steps: &mut [Vec<Step>],
    candidate: &ArrayView2<'_, f32>,
    reference: &ArrayView2<'_, f32>,
) {
    for i in 0..cost.len() {
        for j in 0..cost[i].len() {
            let local = frame_distance(candidate, reference, i, j);
            if i == 0 && j == 0 {
                cost[0][0] = local;
                continue;
            }
            let mut best = (f64::INFINITY, Step::Start);
            if i > 0 && j > 0 {
                best = (cost[i - 1][j - 1] + 2.0 * local, Step::Diagonal);
            }
            if i > 0 && cost[i - 1][j] + local < best.0 {
                best = (cost[i - 1][j] + local, Step::Down);
            }
            if j > 0 && cost[i][j - 1] + local < best.0 {
                best = (cost[i][j - 1] + local, Step::Right);
            }
            cost[i][j] = best.0;
            steps[i][j] = best.1;
        }
    }
}

fn backtrack_path(steps: &[Vec<Step>], rows: usize, cols: usize) -> Result<Vec<(usize, usize)>> {
    let mut path = Vec::with_capacity(rows + cols);
    let (mut i, mut j) = (rows - 1, cols - 1);
    loop {
        path.push((i, j));
        match steps[i][j] {
            Step::Start if i == 0 && j == 0 => break,
            Step::Diagonal => {
                i -= 1;
                j -= 1;
            }
            Step::Down => i -= 1,
            Step::Right => j -= 1,
            Step::Start => {
                return Err(PronunciationError::alignment(
                    "invalid DTW backtrack encountered",
                ))
            }
        }
    }
    path.reverse();
    Ok(path)
}

fn frame_distance(
    candidate: &ArrayView2<'_, f32>,
    reference: &ArrayView2<'_, f32>,
    i: usize,
    j: usize,
) -> f64 {
    candidate
        .row(i)
        .iter()
        .zip(reference.row(j).iter())
        .map(|(a, b)| {
            let diff = f64::from(*a) - f64::from(*b);
            diff * diff
        })
        .sum::<f64>()
        .sqrt()
}
