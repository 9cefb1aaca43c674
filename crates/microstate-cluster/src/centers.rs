//! Cluster center set: one topography per microstate.

use microstate_signal::SignalError;

use crate::error::ClusterError;

/// Cluster centers of shape `(n_clusters, n_channels)`, stored row-major.
///
/// Rows produced by fitting have unit L2 norm, except rows of clusters that
/// received no samples, which are exactly zero. A center and its negation
/// describe the same microstate.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterCenters {
    n_channels: usize,
    data: Vec<f64>,
}

impl ClusterCenters {
    /// Create a center set from one topography per cluster.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidK`] | Fewer than 2 rows |
    /// | [`ClusterError::Signal`] | Fewer than 2 channels, ragged rows, or non-finite values |
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, ClusterError> {
        if rows.len() < 2 {
            return Err(ClusterError::InvalidK { k: rows.len() });
        }
        let n_channels = rows[0].len();
        if n_channels < 2 {
            return Err(SignalError::TooFewChannels { n_channels }.into());
        }
        for (k, row) in rows.iter().enumerate() {
            if row.len() != n_channels {
                return Err(SignalError::RaggedChannels {
                    channel: k,
                    expected: n_channels,
                    got: row.len(),
                }
                .into());
            }
            if let Some(c) = row.iter().position(|v| !v.is_finite()) {
                return Err(SignalError::NonFiniteValue { channel: c, sample: k }.into());
            }
        }
        Ok(Self { n_channels, data: rows.into_iter().flatten().collect() })
    }

    /// Build from a row-major buffer produced by the solver.
    pub(crate) fn from_flat(n_channels: usize, data: Vec<f64>) -> Self {
        debug_assert!(n_channels > 0 && data.len() % n_channels == 0);
        Self { n_channels, data }
    }

    /// Return the number of cluster centers.
    #[must_use]
    pub fn n_clusters(&self) -> usize {
        self.data.len() / self.n_channels
    }

    /// Return the number of channels per center.
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Return the topography of center `k`.
    ///
    /// # Panics
    ///
    /// Panics if `k >= n_clusters`.
    #[must_use]
    pub fn row(&self, k: usize) -> &[f64] {
        assert!(k < self.n_clusters(), "center {k} out of bounds for {} centers", self.n_clusters());
        &self.data[k * self.n_channels..(k + 1) * self.n_channels]
    }

    /// Iterate over center topographies in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.n_channels)
    }

    /// Copy the centers out as one vector per cluster.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(<[f64]>::to_vec).collect()
    }

    /// Return a copy of the centers with rows permuted so that row `i` of the
    /// result is row `order[i]` of `self`. Values are unchanged.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidOrder`] | `order` is not a permutation of `0..n_clusters` |
    pub fn reorder(&self, order: &[usize]) -> Result<Self, ClusterError> {
        let k = self.n_clusters();
        let mut seen = vec![false; k];
        let is_permutation = order.len() == k
            && order.iter().all(|&i| i < k && !std::mem::replace(&mut seen[i], true));
        if !is_permutation {
            return Err(ClusterError::InvalidOrder { order: order.to_vec(), k });
        }

        let mut data = Vec::with_capacity(self.data.len());
        for &i in order {
            data.extend_from_slice(self.row(i));
        }
        Ok(Self { n_channels: self.n_channels, data })
    }
}
