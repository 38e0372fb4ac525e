//! Configuration builder for random forest training.

use crate::error::RfError;
use crate::result::RandomForestResult;
use crate::split::SplitCriterion;

/// How many features each split may consider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    /// Ceiling of the square root of the feature count.
    Sqrt,
    /// Ceiling of log2 of the feature count, at least 1.
    Log2,
    /// A fraction of the feature count, rounded up.
    Fraction(f64),
    /// A fixed count.
    Fixed(usize),
    /// Every feature.
    All,
}

impl MaxFeatures {
    /// Resolve to a concrete count for `n_features` columns.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidMaxFeatures`] if the count is 0 or exceeds `n_features`.
    pub fn resolve(self, n_features: usize) -> Result<usize, RfError> {
        let n = n_features as f64;
        let resolved = match self {
            MaxFeatures::Sqrt => n.sqrt().ceil() as usize,
            MaxFeatures::Log2 => n.log2().ceil().max(1.0) as usize,
            MaxFeatures::Fraction(f) if f.is_finite() && f > 0.0 => (n * f).ceil() as usize,
            MaxFeatures::Fraction(_) => 0,
            MaxFeatures::Fixed(k) => k,
            MaxFeatures::All => n_features,
        };
        if resolved == 0 || resolved > n_features {
            return Err(RfError::InvalidMaxFeatures {
                max_features: resolved,
                n_features,
            });
        }
        Ok(resolved)
    }
}

/// Configuration for random forest training.
///
/// Construct via [`RandomForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default          |
/// |---------------------|------------------|
/// | `max_features`      | `Sqrt`           |
/// | `max_depth`         | `None`           |
/// | `min_samples_split` | 2                |
/// | `min_samples_leaf`  | 1                |
/// | `criterion`         | `Gini`           |
/// | `seed`              | 0                |
/// | `n_jobs`            | `None` (current rayon pool) |
#[derive(Debug, Clone)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) seed: u64,
    pub(crate) n_jobs: Option<usize>,
}

impl RandomForestConfig {
    /// Create a config for `n_trees` trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, RfError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_features: MaxFeatures::Sqrt,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: SplitCriterion::Gini,
            seed: 0,
            n_jobs: None,
        })
    }

    /// Set the per-split feature budget.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the maximum tree depth. `None` grows until leaves are pure.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum samples a node needs before it may split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum samples each child must keep.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the impurity criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the master seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Train on a dedicated pool of `n_jobs` threads. `None` uses the
    /// current rayon pool.
    #[must_use]
    pub fn with_n_jobs(mut self, n_jobs: Option<usize>) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the per-split feature budget.
    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    /// Return the depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the minimum samples needed to split.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Return the minimum samples per leaf.
    #[must_use]
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    /// Return the impurity criterion.
    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    /// Return the master seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the dedicated thread count, if set.
    #[must_use]
    pub fn n_jobs(&self) -> Option<usize> {
        self.n_jobs
    }

    /// Train a forest.
    ///
    /// `features[sample][feature]` is row-major. `labels[sample]` indexes
    /// into `class_names`. `feature_names` names each column.
    ///
    /// The fitted forest is identical for a given seed whatever the thread count.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::EmptyDataset`] | `features` is empty |
    /// | [`RfError::ZeroFeatures`] | rows have no columns |
    /// | [`RfError::FeatureCountMismatch`] | rows differ in length |
    /// | [`RfError::NonFiniteValue`] | a value is NaN or infinite |
    /// | [`RfError::LabelCountMismatch`] | `labels.len() != features.len()` |
    /// | [`RfError::FeatureNameMismatch`] | `feature_names` does not match the column count |
    /// | [`RfError::LabelOutOfRange`] | a label has no class name |
    /// | [`RfError::InvalidMaxFeatures`] | budget resolves outside `[1, n_features]` |
    /// | [`RfError::InvalidMaxDepth`] | `max_depth` is `Some(0)` |
    /// | [`RfError::InvalidMinSamplesSplit`] | `min_samples_split < 2` |
    /// | [`RfError::InvalidMinSamplesLeaf`] | `min_samples_leaf < 1` |
    /// | [`RfError::InvalidJobCount`] | `n_jobs` is `Some(0)` |
    /// | [`RfError::ThreadPool`] | the dedicated pool cannot start |
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        feature_names: &[String],
        class_names: &[String],
    ) -> Result<RandomForestResult, RfError> {
        crate::forest::train(self, features, labels, feature_names, class_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_trees_rejected() {
        assert!(matches!(
            RandomForestConfig::new(0),
            Err(RfError::InvalidTreeCount { n_trees: 0 })
        ));
    }

    #[test]
    fn defaults() {
        let cfg = RandomForestConfig::new(100).unwrap();
        assert_eq!(cfg.n_trees(), 100);
        assert_eq!(cfg.max_features(), MaxFeatures::Sqrt);
        assert_eq!(cfg.seed(), 0);
        assert_eq!(cfg.n_jobs(), None);
        assert_eq!(cfg.criterion(), SplitCriterion::Gini);
    }

    #[test]
    fn max_features_resolution() {
        assert_eq!(MaxFeatures::Sqrt.resolve(7).unwrap(), 3);
        assert_eq!(MaxFeatures::Log2.resolve(7).unwrap(), 3);
        assert_eq!(MaxFeatures::Log2.resolve(1).unwrap(), 1);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(7).unwrap(), 4);
        assert_eq!(MaxFeatures::All.resolve(7).unwrap(), 7);
        assert!(MaxFeatures::Fixed(8).resolve(7).is_err());
        assert!(MaxFeatures::Fixed(0).resolve(7).is_err());
        assert!(MaxFeatures::Fraction(f64::NAN).resolve(7).is_err());
    }
}
