/// Indices of local maxima whose value is at least `min_height`.
///
/// A flat-topped peak is reported once, at the middle of its plateau.
/// The first and last samples are never peaks.
pub(crate) fn find_peaks(values: &[f64], min_height: f64) -> Vec<usize> {
    let mut peaks = Vec::new();
    if values.len() < 3 {
        return peaks;
    }
    let last = values.len() - 1;
    let mut i = 1;
    while i < last {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < last && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                let peak = (i + ahead - 1) / 2;
                if values[peak] >= min_height {
                    peaks.push(peak);
                }
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    peaks
}
