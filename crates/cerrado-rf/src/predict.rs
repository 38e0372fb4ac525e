//! Prediction on a fitted forest.

use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};

use crate::error::RfError;
use crate::forest::RandomForest;
use crate::node::argmax;
use crate::tree::DecisionTree;

/// Averaged class probabilities for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDistribution {
    probs: Vec<f64>,
}

impl ClassDistribution {
    /// Index of the most probable class, lowest index on ties.
    #[must_use]
    pub fn predicted_class(&self) -> usize {
        argmax(&self.probs)
    }

    /// Probability of the predicted class.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.probs.get(self.predicted_class()).copied().unwrap_or(0.0)
    }

    /// The `k` most probable classes, most probable first.
    #[must_use]
    pub fn top_k(&self, k: usize) -> Vec<(usize, f64)> {
        let mut indexed: Vec<(usize, f64)> = self.probs.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
        indexed.truncate(k);
        indexed
    }

    /// Return the probabilities, one per class.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }
}

impl RandomForest {
    /// Mean of the leaf distributions reached in every tree.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::PredictionFeatureMismatch`] | `sample.len()` differs from the training width |
    /// | [`RfError::NonFiniteValue`] | a value is NaN or infinite |
    pub fn predict_proba(&self, sample: &[f64]) -> Result<ClassDistribution, RfError> {
        self.check_sample(sample, 0)?;
        Ok(self.average(sample))
    }

    /// Predict the class index for one sample.
    ///
    /// # Errors
    ///
    /// Same as [`RandomForest::predict_proba`].
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        Ok(self.predict_proba(sample)?.predicted_class())
    }

    /// Predict the class name for one sample.
    ///
    /// # Errors
    ///
    /// Same as [`RandomForest::predict_proba`].
    pub fn predict_label(&self, sample: &[f64]) -> Result<&str, RfError> {
        let class = self.predict(sample)?;
        Ok(&self.class_names[class])
    }

    /// Predict class indices for many samples in parallel.
    ///
    /// # Errors
    ///
    /// As [`RandomForest::predict_proba`]; `sample_index` in a
    /// [`RfError::NonFiniteValue`] refers to the row in `features`.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, RfError> {
        Ok(self
            .predict_proba_batch(features)?
            .iter()
            .map(ClassDistribution::predicted_class)
            .collect())
    }

    /// Class distributions for many samples in parallel.
    ///
    /// # Errors
    ///
    /// Same as [`RandomForest::predict_batch`].
    pub fn predict_proba_batch(
        &self,
        features: &[Vec<f64>],
    ) -> Result<Vec<ClassDistribution>, RfError> {
        features
            .into_par_iter()
            .enumerate()
            .map(|(i, sample)| {
                self.check_sample(sample, i)?;
                Ok(self.average(sample))
            })
            .collect()
    }

    fn check_sample(&self, sample: &[f64], sample_index: usize) -> Result<(), RfError> {
        if sample.len() != self.n_features() {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features(),
                got: sample.len(),
            });
        }
        if let Some(feature_index) = sample.iter().position(|v| !v.is_finite()) {
            return Err(RfError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
        Ok(())
    }

    fn average(&self, sample: &[f64]) -> ClassDistribution {
        let mut probs = vec![0.0; self.n_classes()];
        for tree in &self.trees {
            for (acc, p) in probs.iter_mut().zip(tree.leaf_distribution(sample)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        probs.iter_mut().for_each(|p| *p /= n);
        ClassDistribution { probs }
    }

    /// Return the number of features in the training schema.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the feature names, in training column order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the class names; class index `i` is `class_names()[i]`.
    #[must_use]
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    /// Return the fitted trees.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}
