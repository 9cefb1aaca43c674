//! Modified K-means: polarity-invariant assign/update loop and multi-restart
//! selection by global explained variance.

use std::cmp::Ordering;

use microstate_signal::{ChannelMatrix, correlation, dot, normalize_in_place};
use rand::Rng;
use rand::seq::index;
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::centers::ClusterCenters;
use crate::config::{ModKMeansConfig, Parallelism};
use crate::error::ClusterError;
use crate::label::ClusterLabel;
use crate::result::FitResult;
use crate::seed::restart_rng;
use crate::variance::ExplainedVariance;

// ── Internal run result ───────────────────────────────────────────────────────

/// Result of a single modified K-means restart.
struct SingleRun {
    centers: Vec<f64>,
    assignments: Vec<ClusterLabel>,
    gev: ExplainedVariance,
    converged: bool,
    iterations: usize,
}

/// Label and signed activation of one sample.
#[derive(Debug, Clone, Copy)]
struct Assignment {
    label: usize,
    activation: f64,
}

// ── assign ────────────────────────────────────────────────────────────────────

/// Assign each sample to the center with the largest absolute activation.
///
/// Ties resolve to the lowest center index.
fn assign(data: &ChannelMatrix, centers: &[f64]) -> Vec<Assignment> {
    let n_channels = data.n_channels();
    data.samples()
        .map(|x| {
            let mut best = Assignment { label: 0, activation: 0.0 };
            let mut best_abs = f64::NEG_INFINITY;
            for (k, center) in centers.chunks_exact(n_channels).enumerate() {
                let a = dot(center, x);
                if a.abs() > best_abs {
                    best_abs = a.abs();
                    best = Assignment { label: k, activation: a };
                }
            }
            best
        })
        .collect()
}

// ── update ────────────────────────────────────────────────────────────────────

/// Recompute every center as the activation-weighted sum of its samples,
/// normalized to unit length. A cluster without samples becomes the zero vector.
fn update(
    data: &ChannelMatrix,
    assignments: &[Assignment],
    k: usize,
    iteration: usize,
) -> Vec<f64> {
    let n_channels = data.n_channels();
    let mut centers = vec![0.0; k * n_channels];
    let mut sizes = vec![0usize; k];

    for (x, a) in data.samples().zip(assignments) {
        sizes[a.label] += 1;
        let row = &mut centers[a.label * n_channels..(a.label + 1) * n_channels];
        for (r, &v) in row.iter_mut().zip(x) {
            *r += v * a.activation;
        }
    }

    for (cluster, (row, &size)) in centers.chunks_exact_mut(n_channels).zip(&sizes).enumerate() {
        if size == 0 {
            warn!(cluster, iteration, "cluster received no samples, center set to zero");
            continue;
        }
        normalize_in_place(row);
    }
    centers
}

/// Unexplained variance per degree of freedom:
/// `|Σ‖x‖² − Σ (c_label · x)²| / (T · (C − 1))`.
fn residual(data: &ChannelMatrix, centers: &[f64], assignments: &[Assignment], total: f64) -> f64 {
    let n_channels = data.n_channels();
    let explained: f64 = data
        .samples()
        .zip(assignments)
        .map(|(x, a)| {
            let p = dot(&centers[a.label * n_channels..(a.label + 1) * n_channels], x);
            p * p
        })
        .sum();
    let dof = (data.n_samples() * (n_channels - 1)) as f64;
    (total - explained).abs() / dof
}

// ── explained variance ────────────────────────────────────────────────────────

fn gev_of(data: &ChannelMatrix, centers: &[f64], labels: &[usize], total: f64) -> ExplainedVariance {
    if total <= 0.0 {
        return ExplainedVariance::from_energy(0.0, total);
    }
    let n_channels = data.n_channels();
    let explained: f64 = data
        .samples()
        .zip(labels)
        .map(|(x, &label)| {
            let center = &centers[label * n_channels..(label + 1) * n_channels];
            let corr = correlation(x, center);
            corr * corr * x.iter().map(|v| v * v).sum::<f64>()
        })
        .sum();
    ExplainedVariance::from_energy(explained, total)
}

/// Global explained variance of `centers` on `data`, labeling each sample
/// with its closest center ignoring polarity.
///
/// Data with zero total energy explains nothing: the result is `0`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ClusterError::ChannelMismatch`] | `data` and `centers` disagree on channel count |
#[instrument(skip(data, centers), fields(n_samples = data.n_samples(), k = centers.n_clusters()))]
pub fn explained_variance(
    data: &ChannelMatrix,
    centers: &ClusterCenters,
) -> Result<ExplainedVariance, ClusterError> {
    if data.n_channels() != centers.n_channels() {
        return Err(ClusterError::ChannelMismatch {
            expected: centers.n_channels(),
            got: data.n_channels(),
        });
    }
    let flat: Vec<f64> = centers.rows().flatten().copied().collect();
    let labels: Vec<usize> = assign(data, &flat).into_iter().map(|a| a.label).collect();
    Ok(gev_of(data, &flat, &labels, data.sum_of_squares()))
}

// ── run_once ──────────────────────────────────────────────────────────────────

/// Run a single restart with its own generator.
///
/// Initial centers are `k` distinct samples drawn uniformly and normalized.
#[instrument(skip(data, rng))]
fn run_once<R: Rng>(
    data: &ChannelMatrix,
    k: usize,
    max_iter: usize,
    tol: f64,
    restart: usize,
    rng: &mut R,
) -> SingleRun {
    let n_channels = data.n_channels();
    let n_samples = data.n_samples();
    let total = data.sum_of_squares();

    let mut centers = Vec::with_capacity(k * n_channels);
    for i in index::sample(rng, n_samples, k) {
        let start = centers.len();
        centers.extend_from_slice(data.sample(i));
        if normalize_in_place(&mut centers[start..]) == 0.0 {
            warn!(sample = i, "initial center drawn from a zero-energy sample");
        }
    }

    let mut prev_residual = f64::INFINITY;
    let mut converged = false;
    let mut iterations = 0usize;

    for iteration in 0..max_iter {
        iterations = iteration + 1;

        let assignments = assign(data, &centers);
        centers = update(data, &assignments, k, iteration);
        let res = residual(data, &centers, &assignments, total);

        debug!(iteration, residual = res, "iteration complete");

        if prev_residual - res <= tol * res {
            converged = true;
            debug!(iteration, "converged");
            break;
        }
        prev_residual = res;
    }

    if !converged {
        warn!(restart, max_iter, "modified k-means did not converge, returning last centers");
    }

    let labels: Vec<usize> = assign(data, &centers).into_iter().map(|a| a.label).collect();
    let gev = gev_of(data, &centers, &labels, total);

    info!(restart, iterations, gev = gev.value(), converged, "single restart complete");

    SingleRun {
        centers,
        assignments: labels.into_iter().map(ClusterLabel::new).collect(),
        gev,
        converged,
        iterations,
    }
}

// ── multi_restart ─────────────────────────────────────────────────────────────

/// Run `config.n_init` independent restarts and keep the one with the highest
/// global explained variance.
///
/// Restart `i` draws from the generator derived from `(base_seed, i)`. All
/// runs are collected in restart order before selection, and only a strictly
/// higher GEV displaces the current best, so the result does not depend on
/// scheduling.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ClusterError::ThreadPool`] | A dedicated pool cannot be built |
/// | [`ClusterError::InvalidRestarts`] | `n_init` is zero |
#[instrument(skip(data, config), fields(k = config.k, n_init = config.n_init))]
pub(crate) fn multi_restart(
    data: &ChannelMatrix,
    config: &ModKMeansConfig,
) -> Result<FitResult, ClusterError> {
    let seed = config.random_state.resolve();
    let run = |restart: usize| {
        let mut rng = restart_rng(seed, restart);
        run_once(data, config.k, config.max_iter, config.tol, restart, &mut rng)
    };

    let runs: Vec<SingleRun> = match config.n_jobs {
        Parallelism::Sequential => (0..config.n_init).map(run).collect(),
        Parallelism::Global => (0..config.n_init).into_par_iter().map(run).collect(),
        Parallelism::Threads(n_threads) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(n_threads).build()?;
            pool.install(|| (0..config.n_init).into_par_iter().map(run).collect())
        }
    };

    let n_init_used = runs.len();
    let best = runs
        .into_iter()
        .reduce(|best, run| match run.gev.total_cmp(&best.gev) {
            Ordering::Greater => run,
            _ => best,
        })
        .ok_or(ClusterError::InvalidRestarts { n_init: config.n_init })?;

    info!(
        k = config.k,
        n_init = n_init_used,
        seed,
        best_gev = best.gev.value(),
        "multi-restart complete"
    );

    Ok(FitResult {
        centers: ClusterCenters::from_flat(data.n_channels(), best.centers),
        gev: best.gev,
        assignments: best.assignments,
        converged: best.converged,
        iterations: best.iterations,
        n_init_used,
        seed,
    })
}
