//! Small vector helpers shared by the correlation and clustering kernels.

/// Inner product of two equal-length slices.
///
/// Extra trailing elements of the longer slice are ignored; callers pass
/// topographies of identical channel count.
#[must_use]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Sum of squared values.
#[must_use]
pub fn sum_of_squares(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

/// Euclidean (L2) norm.
#[must_use]
pub fn l2_norm(values: &[f64]) -> f64 {
    sum_of_squares(values).sqrt()
}

/// Scale `values` to unit L2 norm and return the norm it had before scaling.
///
/// A zero vector is left untouched (there is no direction to keep) and `0.0`
/// is returned so the caller can detect the degenerate case.
pub fn normalize_in_place(values: &mut [f64]) -> f64 {
    let norm = l2_norm(values);
    if norm > 0.0 {
        for v in values.iter_mut() {
            *v /= norm;
        }
    }
    norm
}

/// Population standard deviation (divides by n, not n-1).
///
/// Returns `0.0` for an empty slice.
#[must_use]
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_basic() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, -5.0, 6.0]), 12.0);
    }

    #[test]
    fn norm_of_pythagorean_triple() {
        assert!((l2_norm(&[3.0, 4.0]) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_unit_length() {
        let mut v = vec![3.0, 0.0, 4.0];
        let norm = normalize_in_place(&mut v);
        assert!((norm - 5.0).abs() < 1e-12);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_zero_vector_untouched() {
        let mut v = vec![0.0; 4];
        let norm = normalize_in_place(&mut v);
        assert_eq!(norm, 0.0);
        assert!(v.iter().all(|&x| x == 0.0), "zero vector must stay zero, got {v:?}");
    }

    #[test]
    fn population_std_known_value() {
        // mean 5, squared deviations sum to 32 over 8 values
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn population_std_constant_and_empty() {
        assert_eq!(population_std(&[3.0, 3.0, 3.0]), 0.0);
        assert_eq!(population_std(&[]), 0.0);
    }
}
