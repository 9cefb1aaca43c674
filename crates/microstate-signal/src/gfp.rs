//! Global field power and peak extraction.
//!
//! Samples at local maxima of the global field power (GFP) have the highest
//! signal-to-noise ratio and the most stable topographies, so clustering is
//! often run on the GFP peaks only.

use tracing::{debug, instrument};

use crate::error::SignalError;
use crate::matrix::ChannelMatrix;
use crate::ops::population_std;

/// Global field power: the population standard deviation across channels at
/// every sample.
#[must_use]
pub fn global_field_power(data: &ChannelMatrix) -> Vec<f64> {
    data.samples().map(population_std).collect()
}

/// Indices of local maxima of `signal`, ascending.
///
/// A sample is a maximum when it is strictly greater than its left neighbour
/// and strictly greater than the first differing value to its right. Flat
/// plateaus resolve to their middle sample (rounded down). The first and last
/// samples are never maxima.
fn local_maxima(signal: &[f64]) -> Vec<usize> {
    let n = signal.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }

    let last = n - 1;
    let mut i = 1;
    while i < last {
        if signal[i - 1] < signal[i] {
            let mut ahead = i + 1;
            while ahead < last && signal[ahead] == signal[i] {
                ahead += 1;
            }
            if signal[ahead] < signal[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Drop peaks closer than `distance` samples to a higher peak.
///
/// Peaks are visited from highest to lowest; each surviving peak removes its
/// lower neighbours within the distance. Among equal heights the later peak
/// is visited first.
fn select_by_distance(peaks: &[usize], signal: &[f64], distance: usize) -> Vec<usize> {
    let n = peaks.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| signal[peaks[a]].total_cmp(&signal[peaks[b]]));

    let mut keep = vec![true; n];
    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            k -= 1;
            keep[k] = false;
        }
        let mut k = j + 1;
        while k < n && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

/// Find local maxima of `signal` that are at least `distance` samples apart.
///
/// When two maxima are closer than `distance`, the smaller one is discarded.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`SignalError::InvalidPeakDistance`] | `distance` is zero |
pub fn find_peaks(signal: &[f64], distance: usize) -> Result<Vec<usize>, SignalError> {
    if distance == 0 {
        return Err(SignalError::InvalidPeakDistance { distance });
    }
    let peaks = local_maxima(signal);
    if distance == 1 {
        return Ok(peaks);
    }
    Ok(select_by_distance(&peaks, signal, distance))
}

/// Restrict `data` to the samples at GFP peaks at least `min_peak_distance`
/// samples apart.
///
/// An empty selection is returned as a zero-sample matrix, not an error;
/// callers that need a minimum number of samples check downstream.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`SignalError::InvalidPeakDistance`] | `min_peak_distance` is zero |
#[instrument(skip(data), fields(n_channels = data.n_channels(), n_samples = data.n_samples()))]
pub fn extract_gfp_peaks(
    data: &ChannelMatrix,
    min_peak_distance: usize,
) -> Result<ChannelMatrix, SignalError> {
    let gfp = global_field_power(data);
    let peaks = find_peaks(&gfp, min_peak_distance)?;
    debug!(n_peaks = peaks.len(), "extracted gfp peaks");
    Ok(data.select_samples(&peaks))
}
