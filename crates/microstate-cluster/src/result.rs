//! Result type for modified K-means fitting.

use crate::centers::ClusterCenters;
use crate::label::ClusterLabel;
use crate::variance::ExplainedVariance;

/// Result of a multi-restart modified K-means fit.
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Microstate topographies of the best restart.
    pub centers: ClusterCenters,
    /// Global explained variance of the best restart.
    pub gev: ExplainedVariance,
    /// Cluster assignment of each fitted sample under the final centers.
    pub assignments: Vec<ClusterLabel>,
    /// Whether the best restart converged within its iteration budget.
    pub converged: bool,
    /// Number of iterations performed in the best restart.
    pub iterations: usize,
    /// Number of restarts executed.
    pub n_init_used: usize,
    /// Base seed the restart generators were derived from.
    pub seed: u64,
}

impl FitResult {
    /// Return the number of samples assigned to each cluster.
    ///
    /// Entry `i` holds the count for center `i`; clusters that ended empty report `0`.
    #[must_use]
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.centers.n_clusters()];
        for label in &self.assignments {
            sizes[label.index()] += 1;
        }
        sizes
    }
}
