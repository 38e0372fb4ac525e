//! Criterion benchmarks for cerrado-rf: training, batch prediction, and splitting.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use cerrado_rf::{RandomForestConfig, train_test_split};

fn make_classification(
    n_samples: usize,
    n_features: usize,
    n_classes: usize,
    seed: u64,
) -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>, Vec<String>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = i % n_classes;
        labels.push(class);
        let row: Vec<f64> = (0..n_features)
            .map(|f| {
                let base = if f < 3 { class as f64 * 3.0 } else { 0.0 };
                base + rng.r#gen::<f64>() * 0.5
            })
            .collect();
        features.push(row);
    }
    let names = (0..n_features).map(|f| format!("f{f}")).collect();
    let classes = (0..n_classes).map(|c| format!("class{c}")).collect();
    (features, labels, names, classes)
}

fn bench_rf_train(c: &mut Criterion) {
    let (features, labels, names, classes) = make_classification(500, 7, 3, 42);
    let cfg = RandomForestConfig::new(100).unwrap().with_seed(42);

    c.bench_function("rf_train_500x7_3class_100trees", |b| {
        b.iter(|| cfg.fit(&features, &labels, &names, &classes).unwrap());
    });
}

fn bench_rf_predict_batch(c: &mut Criterion) {
    let (features, labels, names, classes) = make_classification(500, 7, 3, 42);
    let forest = RandomForestConfig::new(100)
        .unwrap()
        .with_seed(42)
        .fit(&features, &labels, &names, &classes)
        .unwrap()
        .into_forest();

    c.bench_function("rf_predict_batch_500x7_100trees", |b| {
        b.iter(|| forest.predict_batch(&features).unwrap());
    });
}

fn bench_train_test_split(c: &mut Criterion) {
    let (features, labels, _, _) = make_classification(10_000, 7, 3, 42);

    c.bench_function("train_test_split_10000x7", |b| {
        b.iter(|| train_test_split(&features, &labels, 0.3, 0).unwrap());
    });
}

criterion_group!(benches, bench_rf_train, bench_rf_predict_batch, bench_train_test_split);
criterion_main!(benches);
