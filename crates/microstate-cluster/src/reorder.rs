//! Template-driven reordering of fitted centers.

use std::collections::HashMap;

use microstate_signal::correlation;
use tracing::{debug, instrument, warn};

use crate::centers::ClusterCenters;
use crate::error::ClusterError;
use crate::template::ReferenceTemplate;

/// Minimum number of channels shared with the template for a reliable match.
pub const MIN_COMMON_CHANNELS: usize = 11;

/// Outcome of [`smart_reorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReorderOutcome {
    /// Centers were matched against the template.
    Reordered {
        /// The reordered centers.
        centers: ClusterCenters,
        /// Row `i` of `centers` is row `order[i]` of the input.
        order: Vec<usize>,
        /// Number of channels shared with the template.
        n_common: usize,
    },
    /// Too few channels in common; the input order is kept.
    Unchanged {
        /// Number of channels shared with the template.
        n_common: usize,
    },
}

impl ReorderOutcome {
    /// Return true if the centers were matched against the template.
    #[must_use]
    pub fn is_reordered(&self) -> bool {
        matches!(self, Self::Reordered { .. })
    }

    /// Number of channels shared with the template.
    #[must_use]
    pub fn n_common(&self) -> usize {
        match self {
            Self::Reordered { n_common, .. } | Self::Unchanged { n_common } => *n_common,
        }
    }
}

/// Reorder `centers` to follow the state order of `template`.
///
/// Both are restricted to their common channels (case-insensitive). Template
/// states and centers are paired greedily by largest absolute correlation;
/// centers then follow their template partner's index, and centers left
/// without a partner keep their relative order at the end.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ClusterError::ChannelNamesMismatch`] | `channel_names` does not have one name per center channel |
#[instrument(skip_all, fields(k = centers.n_clusters(), template = template.name()))]
pub fn smart_reorder(
    centers: &ClusterCenters,
    channel_names: &[String],
    template: &ReferenceTemplate,
) -> Result<ReorderOutcome, ClusterError> {
    if channel_names.len() != centers.n_channels() {
        return Err(ClusterError::ChannelNamesMismatch {
            names: channel_names.len(),
            n_channels: centers.n_channels(),
        });
    }

    let template_index: HashMap<String, usize> = template
        .channel_names()
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_lowercase(), i))
        .collect();

    // (center column, template column) for every shared channel
    let mut used = vec![false; template.channel_names().len()];
    let common: Vec<(usize, usize)> = channel_names
        .iter()
        .enumerate()
        .filter_map(|(c, name)| {
            let t = *template_index.get(&name.to_lowercase())?;
            (!std::mem::replace(&mut used[t], true)).then_some((c, t))
        })
        .collect();
    let n_common = common.len();

    if n_common < MIN_COMMON_CHANNELS {
        warn!(
            n_common,
            required = MIN_COMMON_CHANNELS,
            "not enough channels in common with the template, order unchanged"
        );
        return Ok(ReorderOutcome::Unchanged { n_common });
    }

    let restrict_center = |row: &[f64]| common.iter().map(|&(c, _)| row[c]).collect::<Vec<_>>();
    let restrict_template = |row: &[f64]| common.iter().map(|&(_, t)| row[t]).collect::<Vec<_>>();
    let reduced_centers: Vec<Vec<f64>> = centers.rows().map(restrict_center).collect();
    let reduced_template: Vec<Vec<f64>> = template.maps().rows().map(restrict_template).collect();

    let n_rows = reduced_template.len();
    let n_cols = reduced_centers.len();
    let mat: Vec<f64> = reduced_template
        .iter()
        .flat_map(|t| reduced_centers.iter().map(move |c| correlation(t, c).abs()))
        .collect();

    let mut row_free = vec![true; n_rows];
    let mut col_free = vec![true; n_cols];
    let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(n_rows.min(n_cols));
    while pairs.len() < n_rows.min(n_cols) {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in (0..n_rows).filter(|&i| row_free[i]) {
            for j in (0..n_cols).filter(|&j| col_free[j]) {
                let v = mat[i * n_cols + j];
                if best.is_none_or(|(_, _, b)| v > b) {
                    best = Some((i, j, v));
                }
            }
        }
        let Some((i, j, v)) = best else { break };
        debug!(template_state = i, center = j, abs_corr = v, "paired center with template state");
        row_free[i] = false;
        col_free[j] = false;
        pairs.push((i, j));
    }

    pairs.sort_unstable();
    let mut order: Vec<usize> = pairs.into_iter().map(|(_, j)| j).collect();
    order.extend((0..n_cols).filter(|&j| col_free[j]));

    let reordered = centers.reorder(&order)?;
    Ok(ReorderOutcome::Reordered { centers: reordered, order, n_common })
}
