//! Criterion benchmarks for cerrado-prep: outlier trimming, smoothing, and a full plan.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use cerrado_prep::{Axis, Column, How, PrepPlan, Table, remove_outliers, smooth};

fn make_table(n_rows: usize, n_columns: usize) -> (Table, Vec<String>) {
    let names: Vec<String> = (0..n_columns).map(|j| format!("c{j}")).collect();
    let columns = names
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let values: Vec<Option<f64>> = (0..n_rows)
                .map(|i| {
                    if (i + j) % 97 == 0 {
                        None
                    } else {
                        Some((i as f64 * 0.1 + j as f64).sin() * 10.0 + 50.0)
                    }
                })
                .collect();
            (name.clone(), Column::Numeric(values))
        })
        .collect();
    (Table::new(columns).unwrap(), names)
}

fn bench_remove_outliers(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_outliers");
    for &n_rows in &[1_000usize, 10_000, 100_000] {
        let (table, names) = make_table(n_rows, 7);
        group.bench_with_input(BenchmarkId::from_parameter(n_rows), &table, |b, t| {
            b.iter(|| remove_outliers(t, &names, 3.0).unwrap());
        });
    }
    group.finish();
}

fn bench_smooth(c: &mut Criterion) {
    let mut group = c.benchmark_group("smooth");
    for &n_rows in &[1_000usize, 10_000, 100_000] {
        let (table, names) = make_table(n_rows, 7);
        group.bench_with_input(BenchmarkId::from_parameter(n_rows), &table, |b, t| {
            b.iter(|| smooth(t, &names, 0.5, true).unwrap());
        });
    }
    group.finish();
}

fn bench_plan(c: &mut Criterion) {
    let (table, names) = make_table(10_000, 7);
    let plan = PrepPlan::new()
        .drop_missing(Axis::Rows, How::Any)
        .remove_outliers(names.clone(), 3.0)
        .smooth(names, 0.5, true);

    c.bench_function("plan_10000x7", |b| {
        b.iter(|| plan.apply(&table).unwrap());
    });
}

criterion_group!(benches, bench_remove_outliers, bench_smooth, bench_plan);
criterion_main!(benches);
