/// Scale applied to the uniform tie-breaking jitter in cell selection
///
/// Small enough that jitter only reorders cells whose scores are effectively
/// equal, large enough to dominate accumulated floating-point error.
pub const SELECTION_JITTER: f64 = 1e-6;

/// Select an index from a weight table using a single uniform draw
///
/// Walks the cumulative sum until it passes `r * total`. Entries with zero
/// weight are never selected. When rounding pushes the threshold past the
/// final partial sum, the last non-zero entry is returned. Returns `None`
/// when no entry carries positive weight.
pub fn weighted_choice(weights: &[f64], r: f64) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let threshold = r * total;
    let mut partial = 0.0;
    let mut last_positive = None;

    for (index, &weight) in weights.iter().enumerate() {
        if weight > 0.0 {
            last_positive = Some(index);
            partial += weight;
            if partial >= threshold {
                return Some(index);
            }
        }
    }

    last_positive
}
