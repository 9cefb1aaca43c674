use microstate_signal::{ChannelMatrix, correlation};
use tracing::instrument;

use crate::centers::ClusterCenters;
use crate::error::ClusterError;

/// Best absolute spatial correlation of every sample with any center.
///
/// Polarity is ignored. A sample or center with no spatial variance
/// correlates `0` with everything.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ClusterError::ChannelMismatch`] | `data` and `centers` disagree on channel count |
#[instrument(skip(data, centers), fields(n_samples = data.n_samples(), k = centers.n_clusters()))]
pub fn transform(data: &ChannelMatrix, centers: &ClusterCenters) -> Result<Vec<f64>, ClusterError> {
    if data.n_channels() != centers.n_channels() {
        return Err(ClusterError::ChannelMismatch {
            expected: centers.n_channels(),
            got: data.n_channels(),
        });
    }
    Ok(data
        .samples()
        .map(|x| centers.rows().map(|c| correlation(x, c).abs()).fold(0.0, f64::max))
        .collect())
}

#[cfg(test)]
mod tests {
    use microstate_signal::ChannelMatrix;

    use super::transform;
    use crate::centers::ClusterCenters;
    use crate::error::ClusterError;

    #[test]
    fn scores_are_best_absolute_correlation() {
        let centers = ClusterCenters::from_rows(vec![
            vec![1.0, -1.0, 0.0],
            vec![0.0, 1.0, -1.0],
        ])
        .unwrap();
        let data = ChannelMatrix::from_samples(
            3,
            vec![vec![-2.0, 2.0, 0.0], vec![0.0, 3.0, -3.0], vec![1.0, 1.0, 1.0]],
        )
        .unwrap();
        let scores = transform(&data, &centers).unwrap();
        assert_eq!(scores.len(), 3);
        assert!((scores[0] - 1.0).abs() < 1e-12, "negated topography still scores 1");
        assert!((scores[1] - 1.0).abs() < 1e-12);
        assert_eq!(scores[2], 0.0, "flat sample has no spatial correlation");
    }

    #[test]
    fn channel_mismatch_is_rejected() {
        let centers = ClusterCenters::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let data = ChannelMatrix::from_samples(3, vec![vec![1.0, 0.0, 0.0]]).unwrap();
        assert!(matches!(
            transform(&data, &centers),
            Err(ClusterError::ChannelMismatch { expected: 2, got: 3 })
        ));
    }
}
