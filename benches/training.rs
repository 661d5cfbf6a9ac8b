use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use sample_model::pipeline::{create_nn_model, train_nn_model, NetworkSettings};
use sample_model::training::RandomForest;

fn create_classification_data(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let x = Array2::from_shape_fn((n_rows, n_features), |_| rng.gen::<f64>());
    // Label depends on the first two features
    let y = x
        .rows()
        .into_iter()
        .map(|row| if row[0] + row[n_features.min(2) - 1] > 1.0 { 1.0 } else { 0.0 })
        .collect();
    (x, y)
}

fn bench_random_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_forest");
    group.sample_size(10);

    for n_rows in [100, 1000, 5000].iter() {
        let (x, y) = create_classification_data(*n_rows, 10);

        group.bench_with_input(BenchmarkId::new("fit", n_rows), &(x, y), |b, (x, y)| {
            b.iter(|| {
                let mut model = RandomForest::new(100);
                model.fit(black_box(x), black_box(y)).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_neural_network(c: &mut Criterion) {
    let mut group = c.benchmark_group("neural_network");
    group.sample_size(10);

    let (x, y) = create_classification_data(1000, 10);
    let settings = NetworkSettings::default();

    group.bench_function("fit_10_epochs", |b| {
        b.iter(|| {
            let mut model = create_nn_model(10).unwrap();
            train_nn_model(&mut model, black_box(&x), black_box(&y), &settings).unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_random_forest, bench_neural_network);
criterion_main!(benches);
