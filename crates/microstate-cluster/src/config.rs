//! Configuration builders for modified K-means fitting and competitive segmentation.

use microstate_signal::{ChannelMatrix, SignalError, extract_gfp_peaks};

use crate::centers::ClusterCenters;
use crate::error::ClusterError;
use crate::label::Segmentation;
use crate::result::FitResult;
use crate::seed::RandomState;
use crate::source::Interval;

/// How restarts are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parallelism {
    /// Run restarts one after another on the calling thread.
    Sequential,
    /// Run restarts on the global rayon pool (default).
    #[default]
    Global,
    /// Run restarts on a dedicated pool with this many threads. `0` lets
    /// rayon pick the thread count.
    Threads(usize),
}

/// Configuration for modified K-means clustering.
///
/// Construct via [`ModKMeansConfig::new`], then chain `with_*` methods to override defaults.
///
/// # Defaults
///
/// | Parameter              | Default                  |
/// |------------------------|--------------------------|
/// | `n_init`               | 100                      |
/// | `max_iter`             | 300                      |
/// | `tol`                  | 1e-6                     |
/// | `random_state`         | `RandomState::Entropy`   |
/// | `gfp`                  | false                    |
/// | `min_peak_distance`    | 2                        |
/// | `reject_bad_intervals` | true                     |
/// | `n_jobs`               | `Parallelism::Global`    |
#[derive(Debug, Clone)]
pub struct ModKMeansConfig {
    pub(crate) k: usize,
    pub(crate) n_init: usize,
    pub(crate) max_iter: usize,
    pub(crate) tol: f64,
    pub(crate) random_state: RandomState,
    pub(crate) gfp: bool,
    pub(crate) min_peak_distance: usize,
    pub(crate) reject_bad_intervals: bool,
    pub(crate) n_jobs: Parallelism,
}

impl ModKMeansConfig {
    /// Create a new configuration with the given number of microstates.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidK`] | `k < 2` |
    pub fn new(k: usize) -> Result<Self, ClusterError> {
        if k < 2 {
            return Err(ClusterError::InvalidK { k });
        }
        Ok(Self {
            k,
            n_init: 100,
            max_iter: 300,
            tol: 1e-6,
            random_state: RandomState::Entropy,
            gfp: false,
            min_peak_distance: 2,
            reject_bad_intervals: true,
            n_jobs: Parallelism::Global,
        })
    }

    /// Set the number of independent restarts. The restart with the highest
    /// global explained variance wins.
    #[must_use]
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set the maximum number of iterations per restart.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the relative convergence tolerance on the residual.
    #[must_use]
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the source of randomness for centroid initialization.
    #[must_use]
    pub fn with_random_state(mut self, random_state: impl Into<RandomState>) -> Self {
        self.random_state = random_state.into();
        self
    }

    /// Fit on global field power peaks only.
    #[must_use]
    pub fn with_gfp(mut self, gfp: bool) -> Self {
        self.gfp = gfp;
        self
    }

    /// Set the minimum sample distance between retained GFP peaks.
    #[must_use]
    pub fn with_min_peak_distance(mut self, min_peak_distance: usize) -> Self {
        self.min_peak_distance = min_peak_distance;
        self
    }

    /// Omit bad intervals of continuous recordings from the fitting data.
    #[must_use]
    pub fn with_reject_bad_intervals(mut self, reject_bad_intervals: bool) -> Self {
        self.reject_bad_intervals = reject_bad_intervals;
        self
    }

    /// Set how restarts are scheduled.
    #[must_use]
    pub fn with_n_jobs(mut self, n_jobs: Parallelism) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    /// Return the number of microstates.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Return the number of independent restarts.
    #[must_use]
    pub fn n_init(&self) -> usize {
        self.n_init
    }

    /// Return the maximum number of iterations per restart.
    #[must_use]
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Return the relative convergence tolerance.
    #[must_use]
    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// Return the random state.
    #[must_use]
    pub fn random_state(&self) -> RandomState {
        self.random_state
    }

    /// Return whether fitting uses GFP peaks only.
    #[must_use]
    pub fn gfp(&self) -> bool {
        self.gfp
    }

    /// Return the minimum distance between retained GFP peaks.
    #[must_use]
    pub fn min_peak_distance(&self) -> usize {
        self.min_peak_distance
    }

    /// Return whether bad intervals are omitted when fitting.
    #[must_use]
    pub fn reject_bad_intervals(&self) -> bool {
        self.reject_bad_intervals
    }

    /// Return the restart scheduling.
    #[must_use]
    pub fn n_jobs(&self) -> Parallelism {
        self.n_jobs
    }

    /// Fit `k` microstate topographies to `data` of shape `(channels, samples)`.
    ///
    /// When GFP fitting is enabled the peaks are extracted first.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidRestarts`] | `n_init` is zero |
    /// | [`ClusterError::InvalidMaxIter`] | `max_iter` is zero |
    /// | [`ClusterError::InvalidTolerance`] | `tol` is not positive and finite |
    /// | [`ClusterError::TooFewSamples`] | Fewer samples (or GFP peaks) than `k` |
    /// | [`ClusterError::Signal`] | Fewer than 2 channels or `min_peak_distance` is zero |
    /// | [`ClusterError::ThreadPool`] | A dedicated restart pool cannot be built |
    pub fn fit(&self, data: &ChannelMatrix) -> Result<FitResult, ClusterError> {
        if self.gfp {
            let peaks = extract_gfp_peaks(data, self.min_peak_distance)?;
            self.fit_prepared(&peaks)
        } else {
            self.fit_prepared(data)
        }
    }

    /// Fit on data that already went through peak extraction and interval rejection.
    pub(crate) fn fit_prepared(&self, data: &ChannelMatrix) -> Result<FitResult, ClusterError> {
        self.validate()?;
        if data.n_channels() < 2 {
            return Err(SignalError::TooFewChannels { n_channels: data.n_channels() }.into());
        }
        if data.n_samples() < self.k {
            return Err(ClusterError::TooFewSamples { n_samples: data.n_samples(), k: self.k });
        }
        crate::kmeans::multi_restart(data, self)
    }

    fn validate(&self) -> Result<(), ClusterError> {
        if self.n_init == 0 {
            return Err(ClusterError::InvalidRestarts { n_init: self.n_init });
        }
        if self.max_iter == 0 {
            return Err(ClusterError::InvalidMaxIter { max_iter: self.max_iter });
        }
        if !(self.tol.is_finite() && self.tol > 0.0) {
            return Err(ClusterError::InvalidTolerance { tol: self.tol });
        }
        Ok(())
    }
}

/// Configuration for competitive back-fitting of fixed centers onto data.
///
/// # Defaults
///
/// | Parameter              | Default |
/// |------------------------|---------|
/// | `half_window_size`     | 3       |
/// | `smoothing_factor`     | 0.0     |
/// | `criterion`            | 1e-5    |
/// | `max_iter`             | 1000    |
/// | `reject_bad_intervals` | true    |
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentConfig {
    pub(crate) half_window_size: usize,
    pub(crate) smoothing_factor: f64,
    pub(crate) criterion: f64,
    pub(crate) max_iter: usize,
    pub(crate) reject_bad_intervals: bool,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            half_window_size: 3,
            smoothing_factor: 0.0,
            criterion: 1e-5,
            max_iter: 1000,
            reject_bad_intervals: true,
        }
    }
}

impl SegmentConfig {
    /// Create a segmentation configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of samples on each side of a sample that form its
    /// smoothing window.
    #[must_use]
    pub fn with_half_window_size(mut self, half_window_size: usize) -> Self {
        self.half_window_size = half_window_size;
        self
    }

    /// Set the weight of the temporal smoothing term. `0` disables smoothing.
    #[must_use]
    pub fn with_smoothing_factor(mut self, smoothing_factor: f64) -> Self {
        self.smoothing_factor = smoothing_factor;
        self
    }

    /// Set the relative convergence criterion of the smoothing loop.
    #[must_use]
    pub fn with_criterion(mut self, criterion: f64) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the iteration cap of the smoothing loop.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Leave bad intervals of continuous recordings unlabeled.
    #[must_use]
    pub fn with_reject_bad_intervals(mut self, reject_bad_intervals: bool) -> Self {
        self.reject_bad_intervals = reject_bad_intervals;
        self
    }

    /// Return the smoothing half-window size.
    #[must_use]
    pub fn half_window_size(&self) -> usize {
        self.half_window_size
    }

    /// Return the smoothing factor.
    #[must_use]
    pub fn smoothing_factor(&self) -> f64 {
        self.smoothing_factor
    }

    /// Return the convergence criterion.
    #[must_use]
    pub fn criterion(&self) -> f64 {
        self.criterion
    }

    /// Return the iteration cap.
    #[must_use]
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Return whether bad intervals are left unlabeled.
    #[must_use]
    pub fn reject_bad_intervals(&self) -> bool {
        self.reject_bad_intervals
    }

    /// Label every sample of `data` with its microstate.
    ///
    /// Samples inside `excluded` are unlabeled, and so are retained stretches
    /// too short to hold a full smoothing window.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::ChannelMismatch`] | `data` and `centers` disagree on channel count |
    /// | [`ClusterError::InvalidSmoothingFactor`] | Factor is negative or not finite |
    /// | [`ClusterError::InvalidCriterion`] | Criterion is not positive and finite |
    /// | [`ClusterError::InvalidMaxIter`] | `max_iter` is zero |
    /// | [`ClusterError::InvalidInterval`] | An excluded interval is empty or out of bounds |
    pub fn segment(
        &self,
        data: &ChannelMatrix,
        centers: &ClusterCenters,
        excluded: &[Interval],
    ) -> Result<Segmentation, ClusterError> {
        if !(self.smoothing_factor.is_finite() && self.smoothing_factor >= 0.0) {
            return Err(ClusterError::InvalidSmoothingFactor { factor: self.smoothing_factor });
        }
        if !(self.criterion.is_finite() && self.criterion > 0.0) {
            return Err(ClusterError::InvalidCriterion { criterion: self.criterion });
        }
        if self.max_iter == 0 {
            return Err(ClusterError::InvalidMaxIter { max_iter: self.max_iter });
        }
        crate::segment::segment(data, centers, self, excluded)
    }
}

#[cfg(test)]
mod tests {
    use microstate_signal::ChannelMatrix;

    use super::{ModKMeansConfig, Parallelism, SegmentConfig};
    use crate::centers::ClusterCenters;
    use crate::error::ClusterError;
    use crate::seed::RandomState;

    fn tiny() -> ChannelMatrix {
        ChannelMatrix::from_samples(
            3,
            vec![vec![1.0, 0.0, -1.0], vec![0.0, 1.0, -1.0], vec![-1.0, 0.5, 0.5]],
        )
        .unwrap()
    }

    #[test]
    fn new_valid_k() {
        let cfg = ModKMeansConfig::new(4).unwrap();
        assert_eq!(cfg.k(), 4);
        assert_eq!(cfg.n_init(), 100);
        assert_eq!(cfg.max_iter(), 300);
        assert_eq!(cfg.tol(), 1e-6);
        assert_eq!(cfg.random_state(), RandomState::Entropy);
        assert!(!cfg.gfp());
        assert_eq!(cfg.min_peak_distance(), 2);
        assert!(cfg.reject_bad_intervals());
        assert_eq!(cfg.n_jobs(), Parallelism::Global);
    }

    #[test]
    fn new_k_too_small() {
        assert!(matches!(ModKMeansConfig::new(1), Err(ClusterError::InvalidK { k: 1 })));
        assert!(matches!(ModKMeansConfig::new(0), Err(ClusterError::InvalidK { k: 0 })));
    }

    #[test]
    fn builder_chaining() {
        let cfg = ModKMeansConfig::new(3)
            .unwrap()
            .with_n_init(5)
            .with_random_state(99)
            .with_gfp(true)
            .with_n_jobs(Parallelism::Threads(2));
        assert_eq!(cfg.n_init(), 5);
        assert_eq!(cfg.random_state(), RandomState::Seed(99));
        assert!(cfg.gfp());
        assert_eq!(cfg.n_jobs(), Parallelism::Threads(2));
    }

    #[test]
    fn fit_rejects_invalid_knobs() {
        let data = tiny();
        let base = ModKMeansConfig::new(2).unwrap().with_random_state(1);
        assert!(matches!(
            base.clone().with_n_init(0).fit(&data),
            Err(ClusterError::InvalidRestarts { n_init: 0 })
        ));
        assert!(matches!(
            base.clone().with_max_iter(0).fit(&data),
            Err(ClusterError::InvalidMaxIter { max_iter: 0 })
        ));
        assert!(matches!(
            base.clone().with_tol(0.0).fit(&data),
            Err(ClusterError::InvalidTolerance { .. })
        ));
        assert!(matches!(
            base.with_tol(f64::NAN).fit(&data),
            Err(ClusterError::InvalidTolerance { .. })
        ));
    }

    #[test]
    fn fit_rejects_too_few_samples() {
        let data = tiny();
        let cfg = ModKMeansConfig::new(4).unwrap().with_random_state(1);
        assert!(matches!(
            cfg.fit(&data),
            Err(ClusterError::TooFewSamples { n_samples: 3, k: 4 })
        ));
    }

    #[test]
    fn segment_defaults() {
        let cfg = SegmentConfig::new();
        assert_eq!(cfg.half_window_size(), 3);
        assert_eq!(cfg.smoothing_factor(), 0.0);
        assert_eq!(cfg.criterion(), 1e-5);
        assert_eq!(cfg.max_iter(), 1000);
        assert!(cfg.reject_bad_intervals());
    }

    #[test]
    fn segment_rejects_invalid_knobs() {
        let data = tiny();
        let centers =
            ClusterCenters::from_rows(vec![vec![1.0, 0.0, -1.0], vec![0.0, 1.0, -1.0]]).unwrap();
        assert!(matches!(
            SegmentConfig::new().with_smoothing_factor(-1.0).segment(&data, &centers, &[]),
            Err(ClusterError::InvalidSmoothingFactor { .. })
        ));
        assert!(matches!(
            SegmentConfig::new().with_criterion(0.0).segment(&data, &centers, &[]),
            Err(ClusterError::InvalidCriterion { .. })
        ));
        assert!(matches!(
            SegmentConfig::new().with_max_iter(0).segment(&data, &centers, &[]),
            Err(ClusterError::InvalidMaxIter { max_iter: 0 })
        ));
    }
}
