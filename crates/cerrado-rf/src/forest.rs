//! Random forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::RandomForestConfig;
use crate::error::RfError;
use crate::importance::aggregate_importances;
use crate::result::{RandomForestResult, TrainingMetadata};
use crate::tree::{DecisionTree, TreeParams, grow};

/// A fitted random forest.
///
/// Carries the feature and class names of its training schema. Read-only
/// once built.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) feature_names: Vec<String>,
    pub(crate) class_names: Vec<String>,
}

/// Check every row has `n_features` finite values.
pub(crate) fn validate_rows(features: &[Vec<f64>], n_features: usize) -> Result<(), RfError> {
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(RfError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(RfError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(())
}

fn validate_params(config: &RandomForestConfig, n_features: usize) -> Result<TreeParams, RfError> {
    if config.max_depth == Some(0) {
        return Err(RfError::InvalidMaxDepth { max_depth: 0 });
    }
    if config.min_samples_split < 2 {
        return Err(RfError::InvalidMinSamplesSplit {
            min_samples_split: config.min_samples_split,
        });
    }
    if config.min_samples_leaf < 1 {
        return Err(RfError::InvalidMinSamplesLeaf {
            min_samples_leaf: config.min_samples_leaf,
        });
    }
    Ok(TreeParams {
        criterion: config.criterion,
        max_depth: config.max_depth,
        min_samples_split: config.min_samples_split,
        min_samples_leaf: config.min_samples_leaf,
        max_features: config.max_features.resolve(n_features)?,
    })
}

/// Draw `n` indices uniformly with replacement.
fn bootstrap(n: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
    class_names: &[String],
) -> Result<RandomForestResult, RfError> {
    let n_samples = features.len();
    if n_samples == 0 {
        return Err(RfError::EmptyDataset);
    }
    let n_features = features[0].len();
    if n_features == 0 {
        return Err(RfError::ZeroFeatures);
    }
    validate_rows(features, n_features)?;
    if labels.len() != n_samples {
        return Err(RfError::LabelCountMismatch {
            n_samples,
            n_labels: labels.len(),
        });
    }
    if feature_names.len() != n_features {
        return Err(RfError::FeatureNameMismatch {
            expected: n_features,
            got: feature_names.len(),
        });
    }
    let n_classes = class_names.len();
    if let Some((sample_index, &label)) = labels.iter().enumerate().find(|(_, l)| **l >= n_classes) {
        return Err(RfError::LabelOutOfRange {
            sample_index,
            label,
            n_classes,
        });
    }
    let params = validate_params(config, n_features)?;

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features = params.max_features,
        "training random forest"
    );

    // Per-tree seeds are drawn up front so the forest does not depend on scheduling.
    let mut master = ChaCha8Rng::seed_from_u64(config.seed);
    let seeds: Vec<u64> = (0..config.n_trees).map(|_| master.r#gen()).collect();

    let columns: Vec<Vec<f64>> = (0..n_features)
        .map(|f| features.iter().map(|row| row[f]).collect())
        .collect();

    let build = || -> Vec<DecisionTree> {
        seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let samples = bootstrap(n_samples, &mut rng);
                grow(&params, &columns, labels, n_classes, &samples, rng.r#gen())
            })
            .collect()
    };

    let trees = match config.n_jobs {
        None => build(),
        Some(0) => return Err(RfError::InvalidJobCount { n_jobs: 0 }),
        Some(n_jobs) => rayon::ThreadPoolBuilder::new()
            .num_threads(n_jobs)
            .build()
            .map_err(|source| RfError::ThreadPool { n_jobs, source })?
            .install(build),
    };

    debug!(
        mean_depth = trees.iter().map(DecisionTree::depth).sum::<usize>() as f64 / trees.len() as f64,
        "trees grown"
    );

    let per_tree: Vec<Vec<f64>> = trees.iter().map(DecisionTree::feature_importances).collect();
    let importances = aggregate_importances(&per_tree, feature_names);

    let forest = RandomForest {
        trees,
        feature_names: feature_names.to_vec(),
        class_names: class_names.to_vec(),
    };
    let metadata = TrainingMetadata {
        n_trees: config.n_trees,
        n_features,
        n_classes,
        n_samples,
        max_features_resolved: params.max_features,
    };

    info!("random forest training complete");
    Ok(RandomForestResult::new(forest, importances, metadata))
}
