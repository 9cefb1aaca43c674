use microstate_signal::SignalError;

use crate::source::SourceKind;

/// Errors from microstate fitting, segmentation and reordering.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// Returned when fewer than two clusters are requested.
    #[error("n_clusters must be at least 2, got {k}")]
    InvalidK {
        /// The invalid cluster count provided.
        k: usize,
    },

    /// Returned when the restart count is zero.
    #[error("n_init must be at least 1, got {n_init}")]
    InvalidRestarts {
        /// The invalid restart count provided.
        n_init: usize,
    },

    /// Returned when an iteration budget is zero.
    #[error("max_iter must be at least 1, got {max_iter}")]
    InvalidMaxIter {
        /// The invalid iteration budget provided.
        max_iter: usize,
    },

    /// Returned when the convergence tolerance is not a positive finite number.
    #[error("tolerance must be positive and finite, got {tol}")]
    InvalidTolerance {
        /// The invalid tolerance provided.
        tol: f64,
    },

    /// Returned when fewer samples are available than clusters requested.
    #[error("need at least {k} samples to fit {k} clusters, got {n_samples}")]
    TooFewSamples {
        /// Number of samples available for fitting.
        n_samples: usize,
        /// Requested number of clusters.
        k: usize,
    },

    /// Returned when data and cluster centers disagree on the channel count.
    #[error("data has {got} channels but cluster centers have {expected}")]
    ChannelMismatch {
        /// Channel count of the cluster centers.
        expected: usize,
        /// Channel count of the data.
        got: usize,
    },

    /// Returned when a center-consuming operation runs before `fit`.
    #[error("model must be fitted before calling {operation}")]
    NotFitted {
        /// Name of the operation that required a fitted model.
        operation: &'static str,
    },

    /// Returned when a reorder permutation is not a bijection on `0..k`.
    #[error("order {order:?} is not a permutation of 0..{k}")]
    InvalidOrder {
        /// The rejected order.
        order: Vec<usize>,
        /// Number of cluster centers.
        k: usize,
    },

    /// Returned when an excluded interval is empty, reversed or out of bounds.
    #[error("interval {start}..{end} is invalid for {n_samples} samples")]
    InvalidInterval {
        /// First sample of the interval.
        start: usize,
        /// One past the last sample of the interval.
        end: usize,
        /// Number of samples of the data the interval applies to.
        n_samples: usize,
    },

    /// Returned when the smoothing factor is negative or not finite.
    #[error("smoothing factor must be non-negative and finite, got {factor}")]
    InvalidSmoothingFactor {
        /// The invalid smoothing factor provided.
        factor: f64,
    },

    /// Returned when the segmentation convergence criterion is not a positive finite number.
    #[error("convergence criterion must be positive and finite, got {criterion}")]
    InvalidCriterion {
        /// The invalid criterion provided.
        criterion: f64,
    },

    /// Returned when the number of channel names differs from the channel count.
    #[error("{names} channel names given for {n_channels} channels")]
    ChannelNamesMismatch {
        /// Number of channel names provided.
        names: usize,
        /// Number of channels in the data.
        n_channels: usize,
    },

    /// Returned when an epoched recording is built from zero trials.
    #[error("epoched recording needs at least one trial")]
    NoTrials,

    /// Returned when an operation does not accept the given recording kind.
    #[error("{operation} does not support {kind} recordings")]
    UnsupportedSource {
        /// Name of the rejecting operation.
        operation: &'static str,
        /// Kind of recording that was passed.
        kind: SourceKind,
    },

    /// Returned when a reference template is malformed.
    #[error("invalid reference template: {reason}")]
    InvalidTemplate {
        /// Why the template was rejected.
        reason: String,
    },

    /// Returned when a dedicated restart thread pool cannot be built.
    #[error("failed to build restart thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Wraps a signal-level error (shape, validation, peak extraction).
    #[error("signal error: {0}")]
    Signal(#[from] SignalError),
}
