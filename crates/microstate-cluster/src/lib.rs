//! EEG microstate analysis with modified K-means.
//!
//! Fits polarity-invariant microstate topographies with multi-restart
//! modified K-means, segments recordings by competitive back-fitting with
//! optional temporal smoothing, and reorders fitted centers against a
//! reference template.

mod centers;
mod config;
mod error;
mod kmeans;
mod label;
mod model;
mod reorder;
mod result;
mod seed;
mod segment;
mod source;
mod template;
mod transform;
mod variance;

pub use centers::ClusterCenters;
pub use config::{ModKMeansConfig, Parallelism, SegmentConfig};
pub use error::ClusterError;
pub use kmeans::explained_variance;
pub use label::{ClusterLabel, Segmentation};
pub use model::{FitState, FittedModel, ModKMeans};
pub use reorder::{MIN_COMMON_CHANNELS, ReorderOutcome, smart_reorder};
pub use result::FitResult;
pub use seed::RandomState;
pub use source::{Interval, Recording, Source, SourceKind};
pub use template::ReferenceTemplate;
pub use transform::transform;
pub use variance::ExplainedVariance;

pub use microstate_signal::{ChannelMatrix, SignalError};
