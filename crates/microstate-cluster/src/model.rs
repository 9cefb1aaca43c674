//! Stateful microstate model: fit on a recording, then segment, score and reorder.

use std::fmt;

use tracing::{info, instrument};

use crate::centers::ClusterCenters;
use crate::config::{ModKMeansConfig, SegmentConfig};
use crate::error::ClusterError;
use crate::label::Segmentation;
use crate::reorder::{ReorderOutcome, smart_reorder};
use crate::source::{Interval, Recording, SourceKind};
use crate::template::ReferenceTemplate;
use crate::transform::transform;
use crate::variance::ExplainedVariance;

/// Centers and metadata of a fitted model.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    /// Microstate topographies.
    pub centers: ClusterCenters,
    /// Global explained variance on the fitting data.
    pub gev: ExplainedVariance,
    /// Kind of recording the model was fitted on.
    pub kind: SourceKind,
    /// Channel names of the fitting recording.
    pub channel_names: Vec<String>,
}

/// Whether a model holds centers.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FitState {
    /// No successful fit yet.
    #[default]
    Unfitted,
    /// Centers are available.
    Fitted(FittedModel),
}

/// Modified K-means microstate model.
#[derive(Debug, Clone)]
pub struct ModKMeans {
    config: ModKMeansConfig,
    state: FitState,
}

impl ModKMeans {
    /// Create an unfitted model.
    #[must_use]
    pub fn new(config: ModKMeansConfig) -> Self {
        Self { config, state: FitState::Unfitted }
    }

    /// Return the fitting configuration.
    #[must_use]
    pub fn config(&self) -> &ModKMeansConfig {
        &self.config
    }

    /// Return the fit state.
    #[must_use]
    pub fn state(&self) -> &FitState {
        &self.state
    }

    /// Return the fitted model, or [`ClusterError::NotFitted`] naming `operation`.
    fn fitted(&self, operation: &'static str) -> Result<&FittedModel, ClusterError> {
        match &self.state {
            FitState::Fitted(model) => Ok(model),
            FitState::Unfitted => Err(ClusterError::NotFitted { operation }),
        }
    }

    /// Return the fitted centers.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::NotFitted`] before a successful [`ModKMeans::fit`].
    pub fn centers(&self) -> Result<&ClusterCenters, ClusterError> {
        Ok(&self.fitted("centers")?.centers)
    }

    /// Return the global explained variance of the fit.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::NotFitted`] before a successful [`ModKMeans::fit`].
    pub fn gev(&self) -> Result<ExplainedVariance, ClusterError> {
        Ok(self.fitted("gev")?.gev)
    }

    /// Fit the model on `recording`, replacing any previous fit.
    ///
    /// Continuous recordings drop their bad intervals when the configuration
    /// rejects them. With GFP fitting, peaks of every epoch are extracted
    /// separately.
    ///
    /// # Errors
    ///
    /// Any error of [`ModKMeansConfig::fit`]. The previous state is kept on error.
    #[instrument(skip_all, fields(kind = %recording.kind(), k = self.config.k()))]
    pub fn fit(&mut self, recording: &Recording) -> Result<ExplainedVariance, ClusterError> {
        let gfp_distance = self.config.gfp().then_some(self.config.min_peak_distance());
        let data = recording.fitting_data(self.config.reject_bad_intervals(), gfp_distance)?;
        let result = self.config.fit_prepared(&data)?;

        info!(gev = result.gev.value(), n_samples = data.n_samples(), "model fitted");

        let gev = result.gev;
        self.state = FitState::Fitted(FittedModel {
            centers: result.centers,
            gev,
            kind: recording.kind(),
            channel_names: recording.channel_names().to_vec(),
        });
        Ok(gev)
    }

    /// Segment a continuous or averaged recording into microstates.
    ///
    /// Bad intervals of continuous recordings are left unlabeled when
    /// `config` rejects them.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::NotFitted`] | The model has no centers |
    /// | [`ClusterError::UnsupportedSource`] | `recording` is epoched |
    /// | [`ClusterError::ChannelMismatch`] | Channel count differs from the fit |
    /// | other | Any error of [`SegmentConfig::segment`] |
    pub fn predict(
        &self,
        recording: &Recording,
        config: &SegmentConfig,
    ) -> Result<Segmentation, ClusterError> {
        let model = self.fitted("predict")?;
        if recording.kind() == SourceKind::Epochs {
            return Err(ClusterError::UnsupportedSource { operation: "predict", kind: SourceKind::Epochs });
        }
        let data = recording.data()?;
        let excluded: &[Interval] =
            if config.reject_bad_intervals() { recording.bad_intervals() } else { &[] };
        config.segment(&data, &model.centers, excluded)
    }

    /// Best absolute correlation of every sample with any center, one vector per trial.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::NotFitted`] | The model has no centers |
    /// | [`ClusterError::ChannelMismatch`] | Channel count differs from the fit |
    pub fn transform(&self, recording: &Recording) -> Result<Vec<Vec<f64>>, ClusterError> {
        let model = self.fitted("transform")?;
        recording.trials().iter().map(|trial| transform(trial, &model.centers)).collect()
    }

    /// Permute the fitted centers so that center `i` becomes `order[i]`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::NotFitted`] | The model has no centers |
    /// | [`ClusterError::InvalidOrder`] | `order` is not a permutation of `0..k` |
    pub fn reorder(&mut self, order: &[usize]) -> Result<(), ClusterError> {
        let reordered = self.fitted("reorder")?.centers.reorder(order)?;
        self.set_centers(reordered);
        Ok(())
    }

    /// Reorder the fitted centers to follow the built-in template.
    ///
    /// # Errors
    ///
    /// See [`ModKMeans::smart_reorder_with`].
    pub fn smart_reorder(&mut self) -> Result<ReorderOutcome, ClusterError> {
        self.smart_reorder_with(ReferenceTemplate::builtin())
    }

    /// Reorder the fitted centers to follow `template`. With too few channels
    /// in common the centers are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::NotFitted`] when the model has no centers.
    pub fn smart_reorder_with(
        &mut self,
        template: &ReferenceTemplate,
    ) -> Result<ReorderOutcome, ClusterError> {
        let model = self.fitted("smart_reorder")?;
        let outcome = smart_reorder(&model.centers, &model.channel_names, template)?;
        if let ReorderOutcome::Reordered { centers, .. } = &outcome {
            self.set_centers(centers.clone());
        }
        Ok(outcome)
    }

    fn set_centers(&mut self, centers: ClusterCenters) {
        if let FitState::Fitted(model) = &mut self.state {
            model.centers = centers;
        }
    }
}

impl fmt::Display for ModKMeans {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModKMeans | n = {} cluster centers | ", self.config.k())?;
        match &self.state {
            FitState::Fitted(model) => write!(f, "fitted ({})", model.kind),
            FitState::Unfitted => f.write_str("unfitted"),
        }
    }
}
