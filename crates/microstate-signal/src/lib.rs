//! Numeric kernels for EEG topography analysis.
//!
//! Pure math library with no I/O. Provides a validated channel-by-sample
//! matrix, vector helpers, Pearson correlation of topography pairs, and
//! global field power with peak extraction.

mod correlation;
mod error;
mod gfp;
mod matrix;
mod ops;

pub use correlation::{correlation, paired_correlation};
pub use error::SignalError;
pub use gfp::{extract_gfp_peaks, find_peaks, global_field_power};
pub use matrix::ChannelMatrix;
pub use ops::{dot, l2_norm, normalize_in_place, population_std, sum_of_squares};
