//! Accuracy regression tests for cerrado-rf.
//!
//! These guard the full split → fit → score path against algorithmic
//! regressions on a deterministic synthetic dataset.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use cerrado_rf::{
    ConfusionMatrix, MaxFeatures, RandomForest, RandomForestConfig, accuracy,
    classification_report, train_test_split,
};

// ---------------------------------------------------------------------------
// Helper: deterministic synthetic classification dataset
// ---------------------------------------------------------------------------

/// 300 samples, 7 features, 3 classes.
///
/// Features 0-2 are informative (class * 3.0 + noise in [0, 0.5]).
/// Features 3-6 are pure noise in [0, 0.5].
/// Samples are assigned round-robin across classes.
fn make_classification() -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let n_samples = 300;
    let n_classes = 3;
    let names: Vec<String> = ["N", "P", "K", "Ca", "Mg", "Fe", "Mn"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = i % n_classes;
        labels.push(class);
        let row: Vec<f64> = (0..names.len())
            .map(|f| {
                let base = if f < 3 { class as f64 * 3.0 } else { 0.0 };
                base + rng.r#gen::<f64>() * 0.5
            })
            .collect();
        features.push(row);
    }
    let classes = vec!["Campo".into(), "Cerrado".into(), "Mata".into()];
    (features, labels, names, classes)
}

#[test]
fn holdout_accuracy_above_threshold() {
    let (x, y, names, classes) = make_classification();
    let split = train_test_split(&x, &y, 0.3, 0).unwrap();
    assert_eq!(split.x_test.len(), 90);

    let result = RandomForestConfig::new(100)
        .unwrap()
        .with_seed(0)
        .fit(&split.x_train, &split.y_train, &names, &classes)
        .unwrap();
    let predicted = result.forest().predict_batch(&split.x_test).unwrap();
    let acc = accuracy(&predicted, &split.y_test).unwrap();
    assert!(acc > 0.95, "holdout accuracy {acc} <= 0.95");

    let report = classification_report(&predicted, &split.y_test, &classes).unwrap();
    assert!((report.accuracy - acc).abs() < 1e-12);
    assert_eq!(report.support, 90);
    assert!(report.classes.iter().all(|c| c.support == 30));
}

#[test]
fn informative_features_rank_first() {
    let (x, y, names, classes) = make_classification();
    let result = RandomForestConfig::new(50)
        .unwrap()
        .with_seed(1)
        .fit(&x, &y, &names, &classes)
        .unwrap();

    let top3: Vec<&str> = result.importances()[..3].iter().map(|f| f.name.as_str()).collect();
    for name in ["N", "P", "K"] {
        assert!(top3.contains(&name), "{name} not in top 3: {top3:?}");
    }
    assert_eq!(result.importances(), result.forest().feature_importances());
}

#[test]
fn single_feature_budget_still_learns() {
    let (x, y, names, classes) = make_classification();
    let split = train_test_split(&x, &y, 0.3, 5).unwrap();
    let forest: RandomForest = RandomForestConfig::new(60)
        .unwrap()
        .with_max_features(MaxFeatures::Fixed(1))
        .with_seed(5)
        .fit(&split.x_train, &split.y_train, &names, &classes)
        .unwrap()
        .into_forest();
    let predicted = forest.predict_batch(&split.x_test).unwrap();
    let cm = ConfusionMatrix::from_labels(&split.y_test, &predicted, 3).unwrap();
    assert!(cm.accuracy() > 0.85, "accuracy {} <= 0.85", cm.accuracy());
}

#[test]
fn split_and_fit_deterministic_per_seed() {
    let (x, y, names, classes) = make_classification();
    let run = || {
        let split = train_test_split(&x, &y, 0.25, 11).unwrap();
        let forest = RandomForestConfig::new(20)
            .unwrap()
            .with_seed(11)
            .fit(&split.x_train, &split.y_train, &names, &classes)
            .unwrap()
            .into_forest();
        (split.test_indices, forest.predict_batch(&split.x_test).unwrap())
    };
    assert_eq!(run(), run());
}
