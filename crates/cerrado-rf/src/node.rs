//! Arena node types for decision trees.

use std::fmt;

/// Zero-based feature column index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based column position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Position of a node inside a tree's `Vec<Node>` arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// The root always sits at position zero.
    pub const ROOT: NodeIndex = NodeIndex(0);

    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A decision tree node. Children are arena indices, not pointers.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// Interior node: samples with `x[feature] <= threshold` go left.
    Split {
        /// Feature tested at this node.
        feature: FeatureIndex,
        /// Split point, the midpoint between two adjacent training values.
        threshold: f64,
        /// Left child.
        left: NodeIndex,
        /// Right child.
        right: NodeIndex,
        /// Training samples that reached this node.
        n_samples: usize,
        /// Weighted impurity decrease, the MDI contribution of this split.
        impurity_decrease: f64,
    },
    /// Terminal node.
    Leaf {
        /// Class proportions of the training samples in this leaf.
        distribution: Vec<f64>,
        /// Training samples that reached this leaf.
        n_samples: usize,
    },
}

impl Node {
    /// Return the number of training samples that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    /// Return `true` for a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Return the majority class of a leaf, lowest index on ties.
    #[must_use]
    pub fn majority_class(&self) -> Option<usize> {
        match self {
            Node::Leaf { distribution, .. } => Some(argmax(distribution)),
            Node::Split { .. } => None,
        }
    }
}

/// Index of the largest value; the first one wins ties.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_index_display_is_prefixed() {
        assert_eq!(FeatureIndex::new(3).to_string(), "f3");
        assert!(FeatureIndex::new(1) < FeatureIndex::new(5));
    }

    #[test]
    fn root_is_zero() {
        assert_eq!(NodeIndex::ROOT.index(), 0);
    }

    #[test]
    fn leaf_majority_prefers_lowest_index_on_tie() {
        let leaf = Node::Leaf {
            distribution: vec![0.4, 0.4, 0.2],
            n_samples: 5,
        };
        assert!(leaf.is_leaf());
        assert_eq!(leaf.majority_class(), Some(0));
        assert_eq!(leaf.n_samples(), 5);
    }

    #[test]
    fn split_has_no_majority() {
        let split = Node::Split {
            feature: FeatureIndex::new(0),
            threshold: 1.5,
            left: NodeIndex::new(1),
            right: NodeIndex::new(2),
            n_samples: 8,
            impurity_decrease: 2.0,
        };
        assert!(!split.is_leaf());
        assert_eq!(split.majority_class(), None);
        assert_eq!(split.n_samples(), 8);
    }

    #[test]
    fn argmax_first_wins() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7]), 1);
        assert_eq!(argmax(&[1.0]), 0);
    }
}
