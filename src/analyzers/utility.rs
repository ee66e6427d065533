/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Quantile `q` (0.0–1.0) of already sorted values, interpolating linearly
/// between the two closest ranks. Returns `None` for empty input.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Returns a sorted copy of `values`.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Share of values matching `pred`. Returns 0.0 for empty input.
pub fn fraction(values: &[f64], pred: impl Fn(f64) -> bool) -> f64 {
    let indicators: Vec<f64> = values
        .iter()
        .map(|&v| if pred(v) { 1.0 } else { 0.0 })
        .collect();
    mean(&indicators)
}
