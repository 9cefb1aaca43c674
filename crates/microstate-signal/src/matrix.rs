//! Channel-by-sample observation matrix with validation guarantees.

use std::ops::{Index, Range};

use crate::error::SignalError;
use crate::ops;

/// Owned, validated observation matrix of shape `(n_channels, n_samples)`.
///
/// Guarantees at least two channels and finite values. Storage is
/// sample-major: the topography of each sample is a contiguous slice of
/// length `n_channels`, which is the access pattern of every clustering
/// kernel. A matrix may hold zero samples (e.g. an empty peak selection).
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMatrix {
    n_channels: usize,
    n_samples: usize,
    data: Vec<f64>,
}

impl ChannelMatrix {
    /// Create a matrix from channel-major values: `values[c * n_samples + t]`
    /// is channel `c` at sample `t`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SignalError::TooFewChannels`] | `n_channels < 2` |
    /// | [`SignalError::ShapeMismatch`] | `values.len() != n_channels * n_samples` |
    /// | [`SignalError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(n_channels: usize, n_samples: usize, values: Vec<f64>) -> Result<Self, SignalError> {
        if n_channels < 2 {
            return Err(SignalError::TooFewChannels { n_channels });
        }
        let expected = n_channels * n_samples;
        if values.len() != expected {
            return Err(SignalError::ShapeMismatch { expected, got: values.len() });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(SignalError::NonFiniteValue {
                channel: index / n_samples,
                sample: index % n_samples,
            });
        }

        let mut data = vec![0.0; expected];
        for c in 0..n_channels {
            for t in 0..n_samples {
                data[t * n_channels + c] = values[c * n_samples + t];
            }
        }
        Ok(Self { n_channels, n_samples, data })
    }

    /// Create a matrix from one vector per channel.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SignalError::TooFewChannels`] | Fewer than 2 channel rows |
    /// | [`SignalError::RaggedChannels`] | Channel rows differ in length |
    /// | [`SignalError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn from_channels(channels: Vec<Vec<f64>>) -> Result<Self, SignalError> {
        if channels.len() < 2 {
            return Err(SignalError::TooFewChannels { n_channels: channels.len() });
        }
        let n_samples = channels[0].len();
        if let Some((channel, row)) =
            channels.iter().enumerate().find(|(_, row)| row.len() != n_samples)
        {
            return Err(SignalError::RaggedChannels {
                channel,
                expected: n_samples,
                got: row.len(),
            });
        }
        let n_channels = channels.len();
        Self::new(n_channels, n_samples, channels.into_iter().flatten().collect())
    }

    /// Create a matrix from one topography (length `n_channels`) per sample.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SignalError::TooFewChannels`] | `n_channels < 2` |
    /// | [`SignalError::ShapeMismatch`] | A sample does not have `n_channels` values |
    /// | [`SignalError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn from_samples(n_channels: usize, samples: Vec<Vec<f64>>) -> Result<Self, SignalError> {
        if n_channels < 2 {
            return Err(SignalError::TooFewChannels { n_channels });
        }
        if let Some(sample) = samples.iter().find(|s| s.len() != n_channels) {
            return Err(SignalError::ShapeMismatch { expected: n_channels, got: sample.len() });
        }
        let n_samples = samples.len();
        let data: Vec<f64> = samples.into_iter().flatten().collect();
        if let Some(index) = data.iter().position(|v| !v.is_finite()) {
            return Err(SignalError::NonFiniteValue {
                channel: index % n_channels,
                sample: index / n_channels,
            });
        }
        Ok(Self { n_channels, n_samples, data })
    }

    /// Build from sample-major data that is already known to be valid.
    pub(crate) fn from_sample_major_unchecked(
        n_channels: usize,
        n_samples: usize,
        data: Vec<f64>,
    ) -> Self {
        debug_assert!(n_channels >= 2);
        debug_assert_eq!(data.len(), n_channels * n_samples);
        Self { n_channels, n_samples, data }
    }

    /// Concatenate matrices along the sample axis, in order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SignalError::EmptyConcat`] | `parts` is empty |
    /// | [`SignalError::ChannelCountMismatch`] | Parts disagree on channel count |
    pub fn concat<'a, I>(parts: I) -> Result<Self, SignalError>
    where
        I: IntoIterator<Item = &'a ChannelMatrix>,
    {
        let mut parts = parts.into_iter();
        let first = parts.next().ok_or(SignalError::EmptyConcat)?;
        let mut out = first.clone();
        for part in parts {
            if part.n_channels != out.n_channels {
                return Err(SignalError::ChannelCountMismatch {
                    left: out.n_channels,
                    right: part.n_channels,
                });
            }
            out.data.extend_from_slice(&part.data);
            out.n_samples += part.n_samples;
        }
        Ok(out)
    }

    /// Return the number of channels.
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Return the number of samples.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Return true if the matrix holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n_samples == 0
    }

    /// Return the topography of sample `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t >= n_samples`.
    #[must_use]
    pub fn sample(&self, t: usize) -> &[f64] {
        assert!(t < self.n_samples, "sample {t} out of bounds for {} samples", self.n_samples);
        &self.data[t * self.n_channels..(t + 1) * self.n_channels]
    }

    /// Iterate over sample topographies in time order.
    pub fn samples(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.n_channels)
    }

    /// Return a copy of channel `c` across all samples.
    ///
    /// # Panics
    ///
    /// Panics if `c >= n_channels`.
    #[must_use]
    pub fn channel(&self, c: usize) -> Vec<f64> {
        assert!(c < self.n_channels, "channel {c} out of bounds for {} channels", self.n_channels);
        self.samples().map(|s| s[c]).collect()
    }

    /// Return a new matrix holding only the given sample columns, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    #[must_use]
    pub fn select_samples(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.n_channels);
        for &t in indices {
            data.extend_from_slice(self.sample(t));
        }
        Self::from_sample_major_unchecked(self.n_channels, indices.len(), data)
    }

    /// Return a new matrix holding the contiguous sample range `range`.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds or reversed.
    #[must_use]
    pub fn slice_samples(&self, range: Range<usize>) -> Self {
        assert!(
            range.start <= range.end && range.end <= self.n_samples,
            "sample range {range:?} out of bounds for {} samples",
            self.n_samples
        );
        let data = self.data[range.start * self.n_channels..range.end * self.n_channels].to_vec();
        Self::from_sample_major_unchecked(self.n_channels, range.len(), data)
    }

    /// Sum of squares of every value (total signal energy).
    #[must_use]
    pub fn sum_of_squares(&self) -> f64 {
        ops::sum_of_squares(&self.data)
    }

    /// Borrow the raw sample-major buffer.
    #[must_use]
    pub fn as_sample_major(&self) -> &[f64] {
        &self.data
    }

    /// Copy the values out in channel-major order (`(n_channels, n_samples)` row-major).
    #[must_use]
    pub fn to_channel_major(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.data.len()];
        for (t, sample) in self.samples().enumerate() {
            for (c, &v) in sample.iter().enumerate() {
                out[c * self.n_samples + t] = v;
            }
        }
        out
    }
}

impl Index<(usize, usize)> for ChannelMatrix {
    type Output = f64;

    /// Index by `(channel, sample)`.
    fn index(&self, (channel, sample): (usize, usize)) -> &Self::Output {
        assert!(channel < self.n_channels, "channel {channel} out of bounds");
        &self.sample(sample)[channel]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ChannelMatrix {
        // 2 channels x 3 samples
        ChannelMatrix::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
    }

    #[test]
    fn channel_major_layout_is_transposed_to_samples() {
        let m = small();
        assert_eq!(m.n_channels(), 2);
        assert_eq!(m.n_samples(), 3);
        assert_eq!(m.sample(0), &[1.0, 4.0]);
        assert_eq!(m.sample(2), &[3.0, 6.0]);
        assert_eq!(m[(1, 1)], 5.0);
        assert_eq!(m.channel(0), vec![1.0, 2.0, 3.0]);
        assert_eq!(m.to_channel_major(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn rejects_single_channel() {
        let result = ChannelMatrix::new(1, 2, vec![1.0, 2.0]);
        assert!(matches!(result, Err(SignalError::TooFewChannels { n_channels: 1 })));
    }

    #[test]
    fn rejects_shape_mismatch() {
        let result = ChannelMatrix::new(2, 3, vec![1.0; 5]);
        assert!(matches!(result, Err(SignalError::ShapeMismatch { expected: 6, got: 5 })));
    }

    #[test]
    fn rejects_nan_with_position() {
        let result = ChannelMatrix::new(2, 3, vec![0.0, 0.0, 0.0, 0.0, f64::NAN, 0.0]);
        assert!(matches!(
            result,
            Err(SignalError::NonFiniteValue { channel: 1, sample: 1 })
        ));
    }

    #[test]
    fn from_channels_rejects_ragged_rows() {
        let result = ChannelMatrix::from_channels(vec![vec![1.0, 2.0], vec![1.0]]);
        assert!(matches!(
            result,
            Err(SignalError::RaggedChannels { channel: 1, expected: 2, got: 1 })
        ));
    }

    #[test]
    fn from_samples_matches_new() {
        let a = ChannelMatrix::from_samples(2, vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]])
            .unwrap();
        assert_eq!(a, small());
    }

    #[test]
    fn from_samples_rejects_infinite() {
        let result = ChannelMatrix::from_samples(2, vec![vec![1.0, 2.0], vec![f64::INFINITY, 0.0]]);
        assert!(matches!(
            result,
            Err(SignalError::NonFiniteValue { channel: 0, sample: 1 })
        ));
    }

    #[test]
    fn select_and_slice_samples() {
        let m = small();
        let picked = m.select_samples(&[2, 0]);
        assert_eq!(picked.n_samples(), 2);
        assert_eq!(picked.sample(0), &[3.0, 6.0]);
        assert_eq!(picked.sample(1), &[1.0, 4.0]);

        let sliced = m.slice_samples(1..3);
        assert_eq!(sliced.channel(1), vec![5.0, 6.0]);

        let empty = m.select_samples(&[]);
        assert!(empty.is_empty());
        assert_eq!(empty.n_channels(), 2);
    }

    #[test]
    fn concat_appends_samples() {
        let m = small();
        let joined = ChannelMatrix::concat([&m, &m.slice_samples(0..1)]).unwrap();
        assert_eq!(joined.n_samples(), 4);
        assert_eq!(joined.sample(3), &[1.0, 4.0]);
    }

    #[test]
    fn concat_rejects_channel_mismatch() {
        let a = small();
        let b = ChannelMatrix::new(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
        let result = ChannelMatrix::concat([&a, &b]);
        assert!(matches!(
            result,
            Err(SignalError::ChannelCountMismatch { left: 2, right: 3 })
        ));
    }

    #[test]
    fn concat_rejects_empty_input() {
        let parts: [&ChannelMatrix; 0] = [];
        assert!(matches!(ChannelMatrix::concat(parts), Err(SignalError::EmptyConcat)));
    }

    #[test]
    fn sum_of_squares_total() {
        assert!((small().sum_of_squares() - 91.0).abs() < 1e-12);
    }
}
