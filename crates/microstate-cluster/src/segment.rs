//! Competitive back-fitting of fixed centers with optional temporal smoothing.

use microstate_signal::{ChannelMatrix, dot, normalize_in_place, population_std};
use tracing::{debug, instrument, warn};

use crate::centers::ClusterCenters;
use crate::config::SegmentConfig;
use crate::error::ClusterError;
use crate::label::Segmentation;
use crate::source::{Interval, retained_ranges};

/// Segment `data`, splitting it around `excluded` intervals first.
///
/// Without exclusions the whole matrix is one block. With exclusions, each
/// retained stretch shorter than `2h + 1` samples stays unlabeled.
#[instrument(
    skip(data, centers, config, excluded),
    fields(n_samples = data.n_samples(), k = centers.n_clusters(), n_excluded = excluded.len())
)]
pub(crate) fn segment(
    data: &ChannelMatrix,
    centers: &ClusterCenters,
    config: &SegmentConfig,
    excluded: &[Interval],
) -> Result<Segmentation, ClusterError> {
    if data.n_channels() != centers.n_channels() {
        return Err(ClusterError::ChannelMismatch {
            expected: centers.n_channels(),
            got: data.n_channels(),
        });
    }

    if excluded.is_empty() {
        return Ok(Segmentation::new(segment_block(data, centers, config)));
    }

    let min_len = config.half_window_size.saturating_mul(2).saturating_add(1);
    let mut labels = vec![Segmentation::UNLABELED; data.n_samples()];
    for range in retained_ranges(data.n_samples(), excluded)? {
        if range.len() < min_len {
            debug!(start = range.start, end = range.end, min_len, "segment too short, left unlabeled");
            continue;
        }
        let block = segment_block(&data.slice_samples(range.clone()), centers, config);
        labels[range].copy_from_slice(&block);
    }
    Ok(Segmentation::new(labels))
}

/// Label one contiguous block. Returns one-based labels with the leading and
/// trailing constant runs set to `0`.
fn segment_block(data: &ChannelMatrix, centers: &ClusterCenters, config: &SegmentConfig) -> Vec<usize> {
    let n_samples = data.n_samples();
    let n_channels = data.n_channels();
    let k = centers.n_clusters();
    if n_samples == 0 {
        return Vec::new();
    }

    // Unit-length states keep `‖x‖² − (s · x)²` a non-negative residual.
    let states: Vec<Vec<f64>> = centers
        .rows()
        .map(|row| {
            let mut row = row.to_vec();
            normalize_in_place(&mut row);
            row
        })
        .collect();

    // Channel-wise standardization over this block, kept sample-major.
    let mut x = data.as_sample_major().to_vec();
    for c in 0..n_channels {
        let mut channel = data.channel(c);
        let std = population_std(&channel);
        if std > 0.0 {
            channel.iter_mut().for_each(|v| *v /= std);
            for (t, v) in channel.into_iter().enumerate() {
                x[t * n_channels + c] = v;
            }
        }
    }

    let sample = |t: usize| &x[t * n_channels..(t + 1) * n_channels];
    let energy: Vec<f64> = (0..n_samples).map(|t| sample(t).iter().map(|v| v * v).sum()).collect();
    // proj[t * k + j] = (s_j · x_t)²
    let proj: Vec<f64> = (0..n_samples)
        .flat_map(|t| states.iter().map(move |s| dot(s, sample(t)).powi(2)))
        .collect();

    let dof = (n_samples * (n_channels - 1)) as f64;
    let residual = |labels: &[usize]| -> f64 {
        labels.iter().enumerate().map(|(t, &j)| energy[t] - proj[t * k + j]).sum::<f64>() / dof
    };

    let mut labels: Vec<usize> = (0..n_samples)
        .map(|t| {
            let scores = &proj[t * k..(t + 1) * k];
            first_extreme(scores, |a, b| a > b)
        })
        .collect();

    let e0 = residual(&labels);
    let scale = (2.0 * e0 * (n_channels - 1) as f64).max(f64::MIN_POSITIVE);
    let h = config.half_window_size;
    let factor = config.smoothing_factor;

    let mut e_prev = e0;
    let mut converged = false;
    let mut counts = vec![0usize; k * (n_samples + 1)];
    let mut scores = vec![0.0; k];

    for iteration in 0..config.max_iter {
        // counts[j * (T + 1) + t] = number of samples before t labeled j
        for j in 0..k {
            let base = j * (n_samples + 1);
            counts[base] = 0;
            for t in 0..n_samples {
                counts[base + t + 1] = counts[base + t] + usize::from(labels[t] == j);
            }
        }

        let next: Vec<usize> = (0..n_samples)
            .map(|t| {
                let lo = t.saturating_sub(h);
                let hi = t.saturating_add(h).saturating_add(1).min(n_samples);
                for (j, score) in scores.iter_mut().enumerate() {
                    let base = j * (n_samples + 1);
                    let in_window = (counts[base + hi] - counts[base + lo]) as f64;
                    *score = (energy[t] - proj[t * k + j]) / scale - factor * in_window;
                }
                first_extreme(&scores, |a, b| a < b)
            })
            .collect();
        labels = next;

        let e = residual(&labels);
        debug!(iteration, residual = e, "smoothing iteration complete");
        if (e - e_prev).abs() <= config.criterion * e.abs() {
            converged = true;
            break;
        }
        e_prev = e;
    }

    if !converged {
        warn!(max_iter = config.max_iter, "segmentation smoothing did not converge");
    }

    let mut labels: Vec<usize> = labels.into_iter().map(|j| j + 1).collect();
    clear_boundary_runs(&mut labels);
    labels
}

/// Index of the first element that beats every other under `better`.
fn first_extreme(values: &[f64], better: impl Fn(f64, f64) -> bool) -> usize {
    let mut best = 0;
    for (j, &v) in values.iter().enumerate().skip(1) {
        if better(v, values[best]) {
            best = j;
        }
    }
    best
}

/// Zero the leading and trailing runs of equal labels; partial states at the
/// block edges have unknown duration.
fn clear_boundary_runs(labels: &mut [usize]) {
    let Some((&first, &last)) = labels.first().zip(labels.last()) else {
        return;
    };
    let lead = labels.iter().take_while(|&&l| l == first).count();
    let trail = labels.iter().rev().take_while(|&&l| l == last).count();
    let n = labels.len();
    labels[..lead].fill(Segmentation::UNLABELED);
    labels[n - trail..].fill(Segmentation::UNLABELED);
}

#[cfg(test)]
mod tests {
    use microstate_signal::ChannelMatrix;

    use super::*;

    fn centers() -> ClusterCenters {
        ClusterCenters::from_rows(vec![
            vec![0.5, 0.5, -0.5, -0.5],
            vec![0.5, -0.5, 0.5, -0.5],
            vec![0.5, -0.5, -0.5, 0.5],
        ])
        .unwrap()
    }

    /// Blocks of `len` samples cycling through the three center topographies.
    fn blocks(n_blocks: usize, len: usize) -> ChannelMatrix {
        let c = centers();
        let samples = (0..n_blocks * len)
            .map(|t| {
                let row = c.row((t / len) % 3);
                let sign = if t % 2 == 0 { 1.0 } else { -1.0 };
                let amp = sign * (1.0 + (t % 5) as f64 * 0.1);
                row.iter().map(|v| v * amp).collect()
            })
            .collect();
        ChannelMatrix::from_samples(4, samples).unwrap()
    }

    #[test]
    fn boundary_runs_are_cleared() {
        let mut labels = vec![1, 1, 2, 2, 3, 3, 3];
        clear_boundary_runs(&mut labels);
        assert_eq!(labels, vec![0, 0, 2, 2, 0, 0, 0]);

        let mut single = vec![2, 2, 2];
        clear_boundary_runs(&mut single);
        assert_eq!(single, vec![0, 0, 0]);

        let mut empty: Vec<usize> = Vec::new();
        clear_boundary_runs(&mut empty);
        assert!(empty.is_empty());
    }

    #[test]
    fn first_extreme_keeps_first_tie() {
        assert_eq!(first_extreme(&[1.0, 3.0, 3.0], |a, b| a > b), 1);
        assert_eq!(first_extreme(&[2.0, 1.0, 1.0], |a, b| a < b), 1);
    }

    #[test]
    fn recovers_block_labels_without_smoothing() {
        let data = blocks(6, 10);
        let seg = segment(&data, &centers(), &SegmentConfig::new(), &[]).unwrap();
        assert_eq!(seg.len(), 60);
        // interior blocks carry their center's one-based label
        for block in 1..5 {
            let expected = block % 3 + 1;
            for t in block * 10..(block + 1) * 10 {
                assert_eq!(seg.labels()[t], expected, "sample {t}");
            }
        }
        assert!(seg.labels()[..10].iter().all(|&l| l == 0));
        assert!(seg.labels()[50..].iter().all(|&l| l == 0));
    }

    #[test]
    fn polarity_does_not_change_labels() {
        let data = blocks(4, 8);
        let negated = ChannelMatrix::from_samples(
            4,
            data.samples().map(|x| x.iter().map(|v| -v).collect()).collect(),
        )
        .unwrap();
        let config = SegmentConfig::new().with_smoothing_factor(1.0);
        let a = segment(&data, &centers(), &config, &[]).unwrap();
        let b = segment(&negated, &centers(), &config, &[]).unwrap();
        assert_eq!(a, b);
    }

    /// State 0 over 10..40 with one sample at t = 25 leaning toward state 1,
    /// surrounded by state 2.
    fn isolated_mixture() -> ChannelMatrix {
        let c = centers();
        let state = |t: usize| -> Vec<f64> {
            let sign = if t % 2 == 0 { 1.0 } else { -1.0 };
            let topo: Vec<f64> = match t {
                25 => c.row(0).iter().zip(c.row(1)).map(|(a, b)| 0.45 * a + 0.55 * b).collect(),
                10..40 => c.row(0).to_vec(),
                _ => c.row(2).to_vec(),
            };
            topo.into_iter().map(|v| v * sign).collect()
        };
        ChannelMatrix::from_samples(4, (0..60).map(state).collect()).unwrap()
    }

    #[test]
    fn smoothing_absorbs_isolated_sample() {
        let c = centers();
        let data = isolated_mixture();

        let plain = segment(&data, &c, &SegmentConfig::new(), &[]).unwrap();
        assert_eq!(plain.labels()[25], 2, "closest state wins without smoothing");

        let smooth = SegmentConfig::new().with_smoothing_factor(10.0);
        let smoothed = segment(&data, &c, &smooth, &[]).unwrap();
        assert_eq!(smoothed.len(), 60);
        assert_eq!(smoothed.labels()[25], 1, "neighbours pull the sample back");
        assert!(smoothed.labels()[11..39].iter().all(|&l| l == 1));
    }

    #[test]
    fn iteration_cap_keeps_label_contract() {
        let config = SegmentConfig::new().with_smoothing_factor(10.0).with_max_iter(1);
        let seg = segment(&isolated_mixture(), &centers(), &config, &[]).unwrap();
        let labels = seg.labels();
        assert_eq!(labels.len(), 60);
        assert!(labels.iter().all(|&l| l <= 3));
        assert_eq!(labels[0], 0, "leading run cleared");
        assert_eq!(labels[59], 0, "trailing run cleared");
        assert!(labels[11..39].iter().all(|&l| l == 1), "one pass relabels t = 25");
    }

    #[test]
    fn short_block_terminates() {
        let data = blocks(1, 5);
        let config = SegmentConfig::new().with_half_window_size(3);
        let seg = segment(&data, &centers(), &config, &[]).unwrap();
        assert_eq!(seg.len(), 5);
        assert!(seg.labels().iter().all(|&l| l <= 3));
    }

    #[test]
    fn exclusions_split_and_short_pieces_stay_unlabeled() {
        let data = blocks(7, 10);
        let config = SegmentConfig::new().with_half_window_size(3);
        // retained: 0..25, 30..34 (too short for 2h + 1 = 7), 40..70
        let excluded = [Interval::new(25, 30), Interval::new(34, 40)];
        let seg = segment(&data, &centers(), &config, &excluded).unwrap();
        assert_eq!(seg.len(), 70);
        assert!(seg.labels()[25..40].iter().all(|&l| l == 0));
        assert!(seg.labels()[..25].iter().any(|&l| l != 0));
        assert!(seg.labels()[40..].iter().any(|&l| l != 0));
    }

    #[test]
    fn channel_mismatch_is_rejected() {
        let data = ChannelMatrix::from_samples(2, vec![vec![1.0, 0.0]]).unwrap();
        assert!(matches!(
            segment(&data, &centers(), &SegmentConfig::new(), &[]),
            Err(ClusterError::ChannelMismatch { expected: 4, got: 2 })
        ));
    }
}
