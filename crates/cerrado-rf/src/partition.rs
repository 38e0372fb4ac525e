//! Stratified train/test partitioning.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::error::RfError;

/// Disjoint train and test partitions of a labelled dataset.
///
/// `train_indices[i]` is the original row of `x_train[i]`; likewise for test.
/// Both index lists are ascending and together cover every input row once.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitDataset {
    /// Training feature rows.
    pub x_train: Vec<Vec<f64>>,
    /// Held-out feature rows.
    pub x_test: Vec<Vec<f64>>,
    /// Training labels.
    pub y_train: Vec<usize>,
    /// Held-out labels.
    pub y_test: Vec<usize>,
    /// Original row index of each training sample.
    pub train_indices: Vec<usize>,
    /// Original row index of each held-out sample.
    pub test_indices: Vec<usize>,
}

/// Partition `features`/`labels` into train and test sets, stratified by label.
///
/// The test set receives `ceil(test_fraction * n)` rows shared across classes
/// in proportion to their size (largest remainder), and every class keeps at
/// least one row in the training set. Rows are drawn with a ChaCha8 RNG
/// seeded by `seed`, so the same inputs and seed give the same partition.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`RfError::InvalidTestFraction`] | `test_fraction` not in (0, 1) |
/// | [`RfError::EmptyDataset`] | no rows |
/// | [`RfError::LabelCountMismatch`] | `labels.len() != features.len()` |
/// | [`RfError::TooFewSamplesForSplit`] | a class has a single row |
/// | [`RfError::EmptyPartition`] | the rounded test size leaves no training rows |
#[instrument(skip_all, fields(n_samples = features.len(), test_fraction = test_fraction, seed = seed))]
pub fn train_test_split(
    features: &[Vec<f64>],
    labels: &[usize],
    test_fraction: f64,
    seed: u64,
) -> Result<SplitDataset, RfError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(RfError::InvalidTestFraction { test_fraction });
    }
    let n_samples = features.len();
    if n_samples == 0 {
        return Err(RfError::EmptyDataset);
    }
    if labels.len() != n_samples {
        return Err(RfError::LabelCountMismatch {
            n_samples,
            n_labels: labels.len(),
        });
    }

    let n_classes = labels.iter().max().map_or(0, |&m| m + 1);
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (i, &label) in labels.iter().enumerate() {
        by_class[label].push(i);
    }
    if let Some((class, rows)) = by_class.iter().enumerate().find(|(_, rows)| rows.len() == 1) {
        return Err(RfError::TooFewSamplesForSplit {
            class,
            count: rows.len(),
        });
    }

    let n_test = (test_fraction * n_samples as f64).ceil() as usize;
    if n_test >= n_samples {
        return Err(RfError::EmptyPartition {
            partition: "train",
            n_samples,
            test_fraction,
        });
    }

    let counts: Vec<usize> = by_class.iter().map(Vec::len).collect();
    let allocation = allocate(&counts, n_test);
    debug!(?counts, ?allocation, "test rows per class");

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train_indices = Vec::with_capacity(n_samples - n_test);
    let mut test_indices = Vec::with_capacity(n_test);
    for (mut rows, take) in by_class.into_iter().zip(allocation) {
        rows.shuffle(&mut rng);
        test_indices.extend_from_slice(&rows[..take]);
        train_indices.extend_from_slice(&rows[take..]);
    }
    if test_indices.is_empty() {
        return Err(RfError::EmptyPartition {
            partition: "test",
            n_samples,
            test_fraction,
        });
    }
    train_indices.sort_unstable();
    test_indices.sort_unstable();

    let gather_x = |idx: &[usize]| idx.iter().map(|&i| features[i].clone()).collect::<Vec<_>>();
    let gather_y = |idx: &[usize]| idx.iter().map(|&i| labels[i]).collect::<Vec<_>>();

    info!(
        n_train = train_indices.len(),
        n_test = test_indices.len(),
        "dataset partitioned"
    );

    Ok(SplitDataset {
        x_train: gather_x(&train_indices),
        x_test: gather_x(&test_indices),
        y_train: gather_y(&train_indices),
        y_test: gather_y(&test_indices),
        train_indices,
        test_indices,
    })
}

/// Share `n_test` rows across classes by largest remainder, capping each
/// class at `count - 1`.
fn allocate(counts: &[usize], n_test: usize) -> Vec<usize> {
    let n: usize = counts.iter().sum();
    let share = n_test as f64 / n as f64;
    let exact: Vec<f64> = counts.iter().map(|&c| c as f64 * share).collect();
    let cap = |c: usize| counts[c].saturating_sub(1);

    let mut allocation: Vec<usize> = exact
        .iter()
        .enumerate()
        .map(|(c, q)| (q.floor() as usize).min(cap(c)))
        .collect();

    let mut order: Vec<usize> = (0..counts.len()).filter(|&c| counts[c] > 0).collect();
    order.sort_by(|&a, &b| (exact[b] - exact[b].floor()).total_cmp(&(exact[a] - exact[a].floor())));

    let mut remaining = n_test.saturating_sub(allocation.iter().sum());
    while remaining > 0 {
        let mut placed = false;
        for &c in &order {
            if remaining == 0 {
                break;
            }
            if allocation[c] < cap(c) {
                allocation[c] += 1;
                remaining -= 1;
                placed = true;
            }
        }
        if !placed {
            break;
        }
    }
    allocation
}
