//! Maintainability index.

/// Compute the maintainability index on the 0–100 scale.
///
/// Inputs are the file's Halstead volume, its total cyclomatic complexity,
/// its source line count, and the percentage of commented lines. Logarithm
/// terms are dropped for non-positive inputs, and the result is clamped to
/// `[0, 100]`.
///
/// # Examples
///
/// ```
/// use quarry_metrics::maintainability_index;
///
/// let trivial = maintainability_index(0.0, 0.0, 0.0, 0.0);
/// assert_eq!(trivial, 100.0);
///
/// let dense = maintainability_index(8000.0, 40.0, 900.0, 0.0);
/// assert!(dense < trivial);
/// ```
pub fn maintainability_index(
    volume: f64,
    complexity: f64,
    sloc: f64,
    comment_percent: f64,
) -> f64 {
    let volume_term = if volume > 0.0 { 5.2 * volume.ln() } else { 0.0 };
    let sloc_term = if sloc > 0.0 { 16.2 * sloc.ln() } else { 0.0 };
    let comment_term = 50.0 * (2.4 * comment_percent.to_radians()).sqrt().sin();

    let mi = (171.0 - volume_term - 0.23 * complexity - sloc_term + comment_term) * 100.0 / 171.0;
    mi.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_file_scores_perfect() {
        assert_eq!(maintainability_index(0.0, 0.0, 0.0, 0.0), 100.0);
    }

    #[test]
    fn index_decreases_with_each_factor() {
        let base = maintainability_index(100.0, 2.0, 50.0, 0.0);
        assert!(maintainability_index(1000.0, 2.0, 50.0, 0.0) < base);
        assert!(maintainability_index(100.0, 20.0, 50.0, 0.0) < base);
        assert!(maintainability_index(100.0, 2.0, 500.0, 0.0) < base);
    }

    #[test]
    fn comments_raise_the_index() {
        let bare = maintainability_index(500.0, 5.0, 200.0, 0.0);
        let documented = maintainability_index(500.0, 5.0, 200.0, 30.0);
        assert!(documented > bare);
    }

    #[test]
    fn result_is_clamped() {
        let worst = maintainability_index(1e12, 1000.0, 1e9, 0.0);
        assert_eq!(worst, 0.0);
        let best = maintainability_index(0.0, 0.0, 0.0, 100.0);
        assert_eq!(best, 100.0);
    }
}
