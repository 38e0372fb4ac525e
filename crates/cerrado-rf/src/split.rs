//! Impurity criteria and exhaustive threshold search.

use rand::Rng;

use crate::node::FeatureIndex;

/// Node impurity measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum SplitCriterion {
    /// Gini impurity: `1 - Σ p²`.
    #[default]
    Gini,
    /// Shannon entropy: `-Σ p ln p`.
    Entropy,
}

impl SplitCriterion {
    /// Impurity of a node holding `class_counts` (summing to `n_samples`).
    ///
    /// An empty node has impurity zero.
    #[must_use]
    pub fn impurity(self, class_counts: &[usize], n_samples: usize) -> f64 {
        if n_samples == 0 {
            return 0.0;
        }
        let n = n_samples as f64;
        let proportions = class_counts.iter().filter(|&&c| c > 0).map(|&c| c as f64 / n);
        match self {
            SplitCriterion::Gini => 1.0 - proportions.map(|p| p * p).sum::<f64>(),
            SplitCriterion::Entropy => -proportions.map(|p| p * p.ln()).sum::<f64>(),
        }
    }
}

/// The chosen split for one node.
#[derive(Debug, Clone)]
pub(crate) struct Split {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    pub(crate) impurity_decrease: f64,
    pub(crate) left: Vec<usize>,
    pub(crate) right: Vec<usize>,
}

/// Read-only inputs shared by every split search within one tree.
///
/// `columns` is column-major: `columns[feature][sample]`.
pub(crate) struct SplitSearch<'a> {
    pub(crate) columns: &'a [Vec<f64>],
    pub(crate) labels: &'a [usize],
    pub(crate) n_classes: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_features: usize,
    pub(crate) min_samples_leaf: usize,
}

impl SplitSearch<'_> {
    /// Find the split with the largest weighted impurity decrease among
    /// `max_features` randomly drawn features.
    ///
    /// `counts` are the class counts of `samples`. Returns `None` when every
    /// drawn feature is constant over `samples` or no threshold leaves
    /// `min_samples_leaf` samples on both sides.
    pub(crate) fn best(
        &self,
        samples: &[usize],
        counts: &[usize],
        rng: &mut impl Rng,
    ) -> Option<Split> {
        let n = samples.len();
        let n_features = self.columns.len();
        if n < 2 || n_features == 0 {
            return None;
        }
        let parent = n as f64 * self.criterion.impurity(counts, n);

        // partial Fisher-Yates over the feature order
        let mut order: Vec<usize> = (0..n_features).collect();
        let take = self.max_features.min(n_features);
        for i in 0..take {
            let j = rng.gen_range(i..n_features);
            order.swap(i, j);
        }

        let mut best: Option<(usize, f64, f64)> = None;
        let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n);

        for &feature in &order[..take] {
            let column = &self.columns[feature];
            sorted.clear();
            sorted.extend(samples.iter().map(|&s| (column[s], self.labels[s])));
            sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

            let mut left = vec![0usize; self.n_classes];
            let mut right = counts.to_vec();

            for i in 0..n - 1 {
                let (value, class) = sorted[i];
                left[class] += 1;
                right[class] -= 1;

                let next = sorted[i + 1].0;
                if value == next {
                    continue;
                }
                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let decrease = parent
                    - n_left as f64 * self.criterion.impurity(&left, n_left)
                    - n_right as f64 * self.criterion.impurity(&right, n_right);
                if best.is_none_or(|(_, _, d)| decrease > d) {
                    best = Some((feature, midpoint(value, next), decrease));
                }
            }
        }

        let (feature, threshold, impurity_decrease) = best?;
        let column = &self.columns[feature];
        let (left, right): (Vec<usize>, Vec<usize>) =
            samples.iter().copied().partition(|&s| column[s] <= threshold);

        Some(Split {
            feature: FeatureIndex::new(feature),
            threshold,
            impurity_decrease,
            left,
            right,
        })
    }
}

/// Threshold between two adjacent distinct values. Falls back to `low` when
/// the midpoint rounds up to `high`, so both sides stay non-empty.
fn midpoint(low: f64, high: f64) -> f64 {
    let mid = low + (high - low) / 2.0;
    if mid >= high || !mid.is_finite() { low } else { mid }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn search<'a>(columns: &'a [Vec<f64>], labels: &'a [usize], min_leaf: usize) -> SplitSearch<'a> {
        SplitSearch {
            columns,
            labels,
            n_classes: 2,
            criterion: SplitCriterion::Gini,
            max_features: columns.len(),
            min_samples_leaf: min_leaf,
        }
    }

    #[test]
    fn gini_values() {
        assert_eq!(SplitCriterion::Gini.impurity(&[10, 0], 10), 0.0);
        assert!((SplitCriterion::Gini.impurity(&[5, 5], 10) - 0.5).abs() < 1e-12);
        assert_eq!(SplitCriterion::Gini.impurity(&[0, 0], 0), 0.0);
    }

    #[test]
    fn entropy_values() {
        assert_eq!(SplitCriterion::Entropy.impurity(&[4, 0, 0], 4), 0.0);
        assert!((SplitCriterion::Entropy.impurity(&[3, 3], 6) - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn separable_feature_chosen() {
        // feature 0 is noise, feature 1 separates the classes
        let columns = vec![
            vec![0.3, 0.1, 0.2, 0.3, 0.1, 0.2],
            vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0],
        ];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let samples: Vec<usize> = (0..6).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let split = search(&columns, &labels, 1)
            .best(&samples, &[3, 3], &mut rng)
            .expect("a split exists");
        assert_eq!(split.feature.index(), 1);
        assert!((split.threshold - 6.5).abs() < 1e-12);
        assert_eq!(split.left, vec![0, 1, 2]);
        assert_eq!(split.right, vec![3, 4, 5]);
        // parent 6 * 0.5, children pure
        assert!((split.impurity_decrease - 3.0).abs() < 1e-12);
    }

    #[test]
    fn constant_feature_has_no_split() {
        let columns = vec![vec![5.0; 4]];
        let labels = vec![0, 0, 1, 1];
        let samples: Vec<usize> = (0..4).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(search(&columns, &labels, 1).best(&samples, &[2, 2], &mut rng).is_none());
    }

    #[test]
    fn midpoint_stays_below_upper_value() {
        assert_eq!(midpoint(1.0, 2.0), 1.5);
        let next = f64::from_bits(1.0_f64.to_bits() + 1);
        assert!(midpoint(1.0, next) < next);
    }

    #[test]
    fn min_samples_leaf_respected() {
        let columns = vec![vec![1.0, 10.0]];
        let labels = vec![0, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(search(&columns, &labels, 2).best(&[0, 1], &[1, 1], &mut rng).is_none());
    }
}
