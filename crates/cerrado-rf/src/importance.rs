//! Mean-decrease-in-impurity feature importance.

use crate::forest::RandomForest;
use crate::tree::DecisionTree;

/// A named feature with its normalised importance and 1-based rank.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RankedFeature {
    /// Feature name.
    pub name: String,
    /// Share of total impurity decrease; all features sum to 1.
    pub importance: f64,
    /// 1 for the most important feature.
    pub rank: usize,
}

/// Sum per-tree importances, normalise, and sort descending.
///
/// Ties keep column order.
pub(crate) fn aggregate_importances(per_tree: &[Vec<f64>], names: &[String]) -> Vec<RankedFeature> {
    let mut totals = vec![0.0; names.len()];
    for tree in per_tree {
        for (total, v) in totals.iter_mut().zip(tree) {
            *total += v;
        }
    }
    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        totals.iter_mut().for_each(|v| *v /= sum);
    }

    let mut ranked: Vec<RankedFeature> = names
        .iter()
        .zip(totals)
        .map(|(name, importance)| RankedFeature {
            name: name.clone(),
            importance,
            rank: 0,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for (i, feature) in ranked.iter_mut().enumerate() {
        feature.rank = i + 1;
    }
    ranked
}

impl RandomForest {
    /// Ranked MDI importances of the forest's features, most important first.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<RankedFeature> {
        let per_tree: Vec<Vec<f64>> = self.trees.iter().map(DecisionTree::feature_importances).collect();
        aggregate_importances(&per_tree, &self.feature_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sorted_descending_with_ranks() {
        let ranked = aggregate_importances(
            &[vec![0.2, 0.8, 0.0], vec![0.4, 0.6, 0.0]],
            &names(&["N", "P", "K"]),
        );
        let order: Vec<&str> = ranked.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(order, ["P", "N", "K"]);
        assert_eq!(ranked.iter().map(|f| f.rank).collect::<Vec<_>>(), [1, 2, 3]);
        assert!((ranked[0].importance - 0.7).abs() < 1e-12);
        assert!((ranked.iter().map(|f| f.importance).sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn all_zero_stays_zero() {
        let ranked = aggregate_importances(&[vec![0.0, 0.0]], &names(&["N", "P"]));
        assert!(ranked.iter().all(|f| f.importance == 0.0));
        // stable sort keeps column order on ties
        assert_eq!(ranked[0].name, "N");
    }
}
