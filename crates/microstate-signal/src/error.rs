//! Error types for channel matrix validation and signal kernels.

/// Errors from channel matrix construction and signal computations.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Returned when a matrix has fewer than two channels.
    #[error("need at least 2 channels, got {n_channels}")]
    TooFewChannels {
        /// Number of channels provided.
        n_channels: usize,
    },

    /// Returned when a flat buffer does not hold `n_channels * n_samples` values.
    #[error("expected {expected} values for the declared shape, got {got}")]
    ShapeMismatch {
        /// Number of values implied by the declared shape.
        expected: usize,
        /// Number of values provided.
        got: usize,
    },

    /// Returned when channel rows passed to a constructor differ in length.
    #[error("channel {channel} has {got} samples, expected {expected}")]
    RaggedChannels {
        /// Index of the offending channel row.
        channel: usize,
        /// Length of the first channel row.
        expected: usize,
        /// Length of the offending channel row.
        got: usize,
    },

    /// Returned when a matrix contains NaN, infinity, or negative infinity.
    #[error("non-finite value at channel {channel}, sample {sample}")]
    NonFiniteValue {
        /// Channel of the first non-finite value found.
        channel: usize,
        /// Sample of the first non-finite value found.
        sample: usize,
    },

    /// Returned when two matrices that must share a channel axis do not.
    #[error("channel count mismatch: {left} vs {right}")]
    ChannelCountMismatch {
        /// Channel count of the first operand.
        left: usize,
        /// Channel count of the second operand.
        right: usize,
    },

    /// Returned when two matrices that must share a sample axis do not.
    #[error("sample count mismatch: {left} vs {right}")]
    SampleCountMismatch {
        /// Sample count of the first operand.
        left: usize,
        /// Sample count of the second operand.
        right: usize,
    },

    /// Returned when a concatenation receives no matrices.
    #[error("cannot concatenate an empty list of matrices")]
    EmptyConcat,

    /// Returned when the minimum peak distance is zero.
    #[error("minimum peak distance must be at least 1, got {distance}")]
    InvalidPeakDistance {
        /// The invalid distance provided.
        distance: usize,
    },
}
