//! CART decision trees grown on bootstrap samples.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::node::{Node, NodeIndex, argmax};
use crate::split::{SplitCriterion, SplitSearch};

/// Growth limits shared by every tree in a forest.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: usize,
}

/// Grow one tree over `samples`, which index into the column-major `columns`.
///
/// `samples` may repeat indices (bootstrap draws).
pub(crate) fn grow(
    params: &TreeParams,
    columns: &[Vec<f64>],
    labels: &[usize],
    n_classes: usize,
    samples: &[usize],
    seed: u64,
) -> DecisionTree {
    let mut grower = Grower {
        search: SplitSearch {
            columns,
            labels,
            n_classes,
            criterion: params.criterion,
            max_features: params.max_features,
            min_samples_leaf: params.min_samples_leaf,
        },
        params,
        rng: ChaCha8Rng::seed_from_u64(seed),
        nodes: Vec::new(),
    };
    grower.grow(samples, 0);

    DecisionTree {
        nodes: grower.nodes,
        n_features: columns.len(),
        n_classes,
    }
}

struct Grower<'a> {
    search: SplitSearch<'a>,
    params: &'a TreeParams,
    rng: ChaCha8Rng,
    nodes: Vec<Node>,
}

impl Grower<'_> {
    fn grow(&mut self, samples: &[usize], depth: usize) -> NodeIndex {
        let n_samples = samples.len();
        let mut counts = vec![0usize; self.search.n_classes];
        for &s in samples {
            counts[self.search.labels[s]] += 1;
        }

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let too_deep = self.params.max_depth.is_some_and(|d| depth >= d);
        let split = if pure || too_deep || n_samples < self.params.min_samples_split {
            None
        } else {
            self.search.best(samples, &counts, &mut self.rng)
        };

        let Some(split) = split else {
            let total = n_samples.max(1) as f64;
            return self.push(Node::Leaf {
                distribution: counts.iter().map(|&c| c as f64 / total).collect(),
                n_samples,
            });
        };

        // reserve the parent slot so children get higher indices
        let at = self.push(Node::Leaf {
            distribution: Vec::new(),
            n_samples,
        });
        let left = self.grow(&split.left, depth + 1);
        let right = self.grow(&split.right, depth + 1);
        self.nodes[at.index()] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            n_samples,
            impurity_decrease: split.impurity_decrease,
        };
        at
    }

    fn push(&mut self, node: Node) -> NodeIndex {
        self.nodes.push(node);
        NodeIndex::new(self.nodes.len() - 1)
    }
}

/// A fitted CART tree stored as a node arena rooted at index 0.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    n_classes: usize,
}

impl DecisionTree {
    /// Return the class distribution of the leaf `sample` falls into.
    ///
    /// The caller guarantees `sample.len()` matches the training width.
    pub(crate) fn leaf_distribution(&self, sample: &[f64]) -> &[f64] {
        let mut at = NodeIndex::ROOT;
        loop {
            match &self.nodes[at.index()] {
                Node::Leaf { distribution, .. } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    at = if sample[feature.index()] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Predict the majority class of the leaf `sample` falls into.
    #[must_use]
    pub fn predict(&self, sample: &[f64]) -> usize {
        argmax(self.leaf_distribution(sample))
    }

    /// Mean decrease in impurity per feature, normalised to sum to 1.
    ///
    /// All zeros for a single-leaf tree.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_features];
        for node in &self.nodes {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                totals[feature.index()] += impurity_decrease;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Return the node arena.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the number of nodes.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaves.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the number of classes the tree was grown for.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Depth of the deepest leaf; a lone root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(NodeIndex::ROOT, 0usize)];
        while let Some((at, d)) = stack.pop() {
            match &self.nodes[at.index()] {
                Node::Leaf { .. } => deepest = deepest.max(d),
                Node::Split { left, right, .. } => {
                    stack.push((*left, d + 1));
                    stack.push((*right, d + 1));
                }
            }
        }
        deepest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TreeParams {
        TreeParams {
            criterion: SplitCriterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 2,
        }
    }

    fn columns(rows: &[[f64; 2]]) -> Vec<Vec<f64>> {
        (0..2).map(|f| rows.iter().map(|r| r[f]).collect()).collect()
    }

    #[test]
    fn pure_node_is_single_leaf() {
        let cols = columns(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let tree = grow(&params(), &cols, &[1, 1, 1], 2, &[0, 1, 2], 7);
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict(&[0.0, 0.0]), 1);
        assert_eq!(tree.feature_importances(), vec![0.0, 0.0]);
    }

    #[test]
    fn separable_rows_classified() {
        let cols = columns(&[[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [10.0, 0.0], [11.0, 0.0], [12.0, 0.0]]);
        let labels = [0, 0, 0, 1, 1, 1];
        let tree = grow(&params(), &cols, &labels, 2, &[0, 1, 2, 3, 4, 5], 42);
        assert_eq!(tree.predict(&[2.5, 0.0]), 0);
        assert_eq!(tree.predict(&[11.5, 0.0]), 1);
        assert_eq!(tree.feature_importances(), vec![1.0, 0.0]);
    }

    #[test]
    fn xor_needs_two_levels() {
        let cols = columns(&[[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]]);
        let tree = grow(&params(), &cols, &[0, 1, 1, 0], 2, &[0, 1, 2, 3], 42);
        assert!(tree.depth() >= 2);
        for (row, want) in [([0.0, 0.0], 0), ([0.0, 1.0], 1), ([1.0, 0.0], 1), ([1.0, 1.0], 0)] {
            assert_eq!(tree.predict(&row), want);
        }
    }

    #[test]
    fn max_depth_caps_growth() {
        let cols = columns(&[[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]]);
        let p = TreeParams {
            max_depth: Some(1),
            ..params()
        };
        let tree = grow(&p, &cols, &[0, 1, 1, 0], 2, &[0, 1, 2, 3], 42);
        assert!(tree.depth() <= 1);
    }

    #[test]
    fn repeated_bootstrap_indices_weight_the_leaf() {
        let cols = columns(&[[1.0, 0.0], [1.0, 0.0]]);
        // identical rows, conflicting labels: no split is possible
        let tree = grow(&params(), &cols, &[0, 1], 2, &[0, 0, 0, 1], 1);
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.leaf_distribution(&[1.0, 0.0]), &[0.75, 0.25]);
    }

    #[test]
    fn same_seed_same_tree() {
        let cols = columns(&[[1.0, 5.0], [2.0, 6.0], [3.0, 7.0], [10.0, 15.0], [11.0, 16.0], [12.0, 17.0]]);
        let labels = [0, 0, 0, 1, 1, 1];
        let p = TreeParams {
            max_features: 1,
            ..params()
        };
        let a = grow(&p, &cols, &labels, 2, &[0, 1, 2, 3, 4, 5], 123);
        let b = grow(&p, &cols, &labels, 2, &[0, 1, 2, 3, 4, 5], 123);
        assert_eq!(a, b);
    }
}
