use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use protsel::information_criteria::FitRecord;
use protsel::model_space::{enumerate, ModelGroup};
use protsel::ranking::Ranking;

const N_BRANCHES: usize = 97;
const N_SITES: usize = 1200;

fn synthetic_fits(n_fits: usize, rng: &mut StdRng) -> Vec<FitRecord> {
    enumerate(ModelGroup::Combined)
        .into_iter()
        .cycle()
        .take(n_fits)
        .map(|candidate| {
            let logl = -25000.0 - rng.gen_range(0.0..500.0);
            FitRecord::new(candidate, logl, N_BRANCHES, N_SITES).unwrap()
        })
        .collect()
}

fn ranking(criterion: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let mut bench_group = criterion.benchmark_group("ranking");
    for n_fits in [64, 1024, 16384] {
        let fits = synthetic_fits(n_fits, &mut rng);
        bench_group.bench_function(format!("{}_fits", n_fits), |bench| {
            bench.iter_batched(
                || fits.clone(),
                |fits| black_box(Ranking::new(fits).unwrap()),
                BatchSize::SmallInput,
            );
        });
    }
    bench_group.finish();
}

fn criteria(criterion: &mut Criterion) {
    let candidates = enumerate(ModelGroup::Combined);
    criterion.bench_function("criteria_combined_group", |bench| {
        bench.iter(|| {
            for candidate in &candidates {
                black_box(FitRecord::new(*candidate, -25000.0, N_BRANCHES, N_SITES).unwrap());
            }
        });
    });
}

criterion_group!(benches, ranking, criteria);
criterion_main!(benches);
