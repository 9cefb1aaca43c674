//! Recording sources: continuous, trial-epoched and averaged data.
//!
//! The algorithms only ever see a flat `(channels, samples)` matrix; the
//! source kind decides how that matrix is assembled and how outputs are
//! split back per trial.

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use microstate_signal::{ChannelMatrix, SignalError, extract_gfp_peaks};
use tracing::debug;

use crate::error::ClusterError;

/// Half-open sample interval `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    start: usize,
    end: usize,
}

impl Interval {
    /// Create an interval covering samples `start..end`.
    ///
    /// Bounds are checked against the data when the interval is used.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// First sample of the interval.
    #[must_use]
    pub fn start(self) -> usize {
        self.start
    }

    /// One past the last sample of the interval.
    #[must_use]
    pub fn end(self) -> usize {
        self.end
    }

    /// Number of samples covered.
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Return true if the interval covers no samples.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.end <= self.start
    }
}

impl From<Range<usize>> for Interval {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Validate excluded intervals and return the complementary retained ranges,
/// in ascending order. Overlapping or touching exclusions are merged.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ClusterError::InvalidInterval`] | An interval is empty or ends past `n_samples` |
pub(crate) fn retained_ranges(
    n_samples: usize,
    excluded: &[Interval],
) -> Result<Vec<Range<usize>>, ClusterError> {
    for iv in excluded {
        if iv.is_empty() || iv.end > n_samples {
            return Err(ClusterError::InvalidInterval {
                start: iv.start,
                end: iv.end,
                n_samples,
            });
        }
    }

    let mut sorted = excluded.to_vec();
    sorted.sort_unstable();

    let mut retained = Vec::with_capacity(sorted.len() + 1);
    let mut cursor = 0usize;
    for iv in sorted {
        if iv.start > cursor {
            retained.push(cursor..iv.start);
        }
        cursor = cursor.max(iv.end);
    }
    if cursor < n_samples {
        retained.push(cursor..n_samples);
    }
    Ok(retained)
}

/// Kind of recording a model was fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Continuous recording.
    Raw,
    /// Trial-epoched recording.
    Epochs,
    /// Averaged response.
    Evoked,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Raw => "raw",
            Self::Epochs => "epochs",
            Self::Evoked => "evoked",
        };
        f.write_str(name)
    }
}

/// Data held by a [`Recording`].
#[derive(Debug, Clone)]
pub enum Source {
    /// Continuous data with optional bad intervals.
    Raw {
        /// Channel-by-sample data.
        data: ChannelMatrix,
        /// Intervals marked bad, excluded when rejection is enabled.
        bad_intervals: Vec<Interval>,
    },
    /// One matrix per trial, all with the same channels.
    Epochs {
        /// Trial matrices in order.
        trials: Vec<ChannelMatrix>,
    },
    /// Averaged response.
    Evoked {
        /// Channel-by-sample data.
        data: ChannelMatrix,
    },
}

/// A time-series source with channel names.
#[derive(Debug, Clone)]
pub struct Recording {
    channel_names: Vec<String>,
    source: Source,
}

impl Recording {
    /// Wrap continuous data.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::ChannelNamesMismatch`] | Name count differs from channel count |
    pub fn raw<S: Into<String>>(
        data: ChannelMatrix,
        channel_names: impl IntoIterator<Item = S>,
    ) -> Result<Self, ClusterError> {
        let channel_names = check_names(channel_names, data.n_channels())?;
        Ok(Self {
            channel_names,
            source: Source::Raw { data, bad_intervals: Vec::new() },
        })
    }

    /// Wrap trial-epoched data.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::NoTrials`] | `trials` is empty |
    /// | [`ClusterError::Signal`] | Trials disagree on channel count |
    /// | [`ClusterError::ChannelNamesMismatch`] | Name count differs from channel count |
    pub fn epochs<S: Into<String>>(
        trials: Vec<ChannelMatrix>,
        channel_names: impl IntoIterator<Item = S>,
    ) -> Result<Self, ClusterError> {
        let first = trials.first().ok_or(ClusterError::NoTrials)?;
        let n_channels = first.n_channels();
        if let Some(bad) = trials.iter().find(|t| t.n_channels() != n_channels) {
            return Err(SignalError::ChannelCountMismatch {
                left: n_channels,
                right: bad.n_channels(),
            }
            .into());
        }
        let channel_names = check_names(channel_names, n_channels)?;
        Ok(Self { channel_names, source: Source::Epochs { trials } })
    }

    /// Wrap an averaged response.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::ChannelNamesMismatch`] | Name count differs from channel count |
    pub fn evoked<S: Into<String>>(
        data: ChannelMatrix,
        channel_names: impl IntoIterator<Item = S>,
    ) -> Result<Self, ClusterError> {
        let channel_names = check_names(channel_names, data.n_channels())?;
        Ok(Self { channel_names, source: Source::Evoked { data } })
    }

    /// Mark intervals of a continuous recording as bad.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::UnsupportedSource`] | The recording is not continuous |
    /// | [`ClusterError::InvalidInterval`] | An interval is empty or out of bounds |
    pub fn with_bad_intervals(mut self, intervals: Vec<Interval>) -> Result<Self, ClusterError> {
        let n_samples = match &self.source {
            Source::Raw { data, .. } => data.n_samples(),
            _ => {
                return Err(ClusterError::UnsupportedSource {
                    operation: "bad intervals",
                    kind: self.kind(),
                });
            }
        };
        retained_ranges(n_samples, &intervals)?;
        if let Source::Raw { bad_intervals, .. } = &mut self.source {
            *bad_intervals = intervals;
        }
        Ok(self)
    }

    /// Return the kind of this recording.
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        match self.source {
            Source::Raw { .. } => SourceKind::Raw,
            Source::Epochs { .. } => SourceKind::Epochs,
            Source::Evoked { .. } => SourceKind::Evoked,
        }
    }

    /// Borrow the underlying source.
    #[must_use]
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Channel names, one per channel.
    #[must_use]
    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    /// Number of channels.
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.channel_names.len()
    }

    /// Bad intervals of a continuous recording; empty for other kinds.
    #[must_use]
    pub fn bad_intervals(&self) -> &[Interval] {
        match &self.source {
            Source::Raw { bad_intervals, .. } => bad_intervals,
            _ => &[],
        }
    }

    /// Data split per trial. Continuous and averaged recordings are a single trial.
    #[must_use]
    pub fn trials(&self) -> &[ChannelMatrix] {
        match &self.source {
            Source::Raw { data, .. } | Source::Evoked { data } => std::slice::from_ref(data),
            Source::Epochs { trials } => trials,
        }
    }

    /// All samples as one `(channels, samples)` matrix; trials are concatenated.
    ///
    /// # Errors
    ///
    /// Propagates [`SignalError`] from concatenation (never fires for a
    /// recording built through the constructors).
    pub fn data(&self) -> Result<Cow<'_, ChannelMatrix>, ClusterError> {
        match &self.source {
            Source::Raw { data, .. } | Source::Evoked { data } => Ok(Cow::Borrowed(data)),
            Source::Epochs { trials } => Ok(Cow::Owned(ChannelMatrix::concat(trials)?)),
        }
    }

    /// Start offset of every trial within [`Recording::data`]; `None` for
    /// continuous and averaged recordings.
    #[must_use]
    pub fn trial_boundaries(&self) -> Option<Vec<usize>> {
        match &self.source {
            Source::Epochs { trials } => Some(
                trials
                    .iter()
                    .scan(0usize, |offset, t| {
                        let start = *offset;
                        *offset += t.n_samples();
                        Some(start)
                    })
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Assemble the matrix a model is fitted on.
    ///
    /// Bad intervals of continuous data are dropped when `reject_bad` is set.
    /// With `gfp_distance`, only GFP peaks are kept; for epochs the peaks are
    /// extracted per trial before concatenation.
    pub(crate) fn fitting_data(
        &self,
        reject_bad: bool,
        gfp_distance: Option<usize>,
    ) -> Result<ChannelMatrix, ClusterError> {
        let peaks = |m: &ChannelMatrix| -> Result<ChannelMatrix, ClusterError> {
            match gfp_distance {
                Some(d) => Ok(extract_gfp_peaks(m, d)?),
                None => Ok(m.clone()),
            }
        };

        let data = match &self.source {
            Source::Raw { data, bad_intervals } => {
                if reject_bad && !bad_intervals.is_empty() {
                    let kept: Vec<ChannelMatrix> = retained_ranges(data.n_samples(), bad_intervals)?
                        .into_iter()
                        .map(|r| data.slice_samples(r))
                        .collect();
                    let omitted = data.n_samples() - kept.iter().map(ChannelMatrix::n_samples).sum::<usize>();
                    debug!(omitted, "omitted bad intervals from fitting data");
                    if kept.is_empty() {
                        peaks(&data.select_samples(&[]))?
                    } else {
                        peaks(&ChannelMatrix::concat(&kept)?)?
                    }
                } else {
                    peaks(data)?
                }
            }
            Source::Epochs { trials } => {
                let parts = trials.iter().map(&peaks).collect::<Result<Vec<_>, _>>()?;
                ChannelMatrix::concat(&parts)?
            }
            Source::Evoked { data } => peaks(data)?,
        };
        Ok(data)
    }
}

fn check_names<S: Into<String>>(
    names: impl IntoIterator<Item = S>,
    n_channels: usize,
) -> Result<Vec<String>, ClusterError> {
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    if names.len() != n_channels {
        return Err(ClusterError::ChannelNamesMismatch { names: names.len(), n_channels });
    }
    Ok(names)
}
