//! Pearson correlation of topography pairs.
//!
//! Correlation is computed across channels: each vector is demeaned and
//! scaled to unit length, and the result is the signed cosine between the
//! two. Callers that treat a pattern and its negation as equivalent take the
//! absolute value.

use tracing::instrument;

use crate::error::SignalError;
use crate::matrix::ChannelMatrix;

/// Pearson correlation between two equal-length vectors.
///
/// Returns `0.0` when either vector has zero variance (or the result is not
/// finite for any other reason), so degenerate topographies never leak NaN
/// into downstream sums.
#[must_use]
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len();
    if n == 0 {
        return 0.0;
    }
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let mut cross = 0.0;
    let mut ss_a = 0.0;
    let mut ss_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let da = x - mean_a;
        let db = y - mean_b;
        cross += da * db;
        ss_a += da * da;
        ss_b += db * db;
    }

    let denom = (ss_a * ss_b).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    let r = cross / denom;
    if r.is_finite() { r } else { 0.0 }
}

/// Correlate matching sample columns of two matrices.
///
/// Entry `t` of the result is the correlation between sample `t` of `a` and
/// sample `t` of `b`, computed across channels.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`SignalError::ChannelCountMismatch`] | Matrices differ in channel count |
/// | [`SignalError::SampleCountMismatch`] | Matrices differ in sample count |
#[instrument(skip(a, b), fields(n_channels = a.n_channels(), n_samples = a.n_samples()))]
pub fn paired_correlation(a: &ChannelMatrix, b: &ChannelMatrix) -> Result<Vec<f64>, SignalError> {
    if a.n_channels() != b.n_channels() {
        return Err(SignalError::ChannelCountMismatch {
            left: a.n_channels(),
            right: b.n_channels(),
        });
    }
    if a.n_samples() != b.n_samples() {
        return Err(SignalError::SampleCountMismatch {
            left: a.n_samples(),
            right: b.n_samples(),
        });
    }
    Ok(a.samples().zip(b.samples()).map(|(x, y)| correlation(x, y)).collect())
}
