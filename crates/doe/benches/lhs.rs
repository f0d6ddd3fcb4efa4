use aerogp_doe::{FullFactorial, Lhs, LhsKind, SamplingMethod};
use criterion::{Criterion, criterion_group, criterion_main};
use ndarray::aview1;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

fn criterion_doe(c: &mut Criterion) {
    let dims = [2, 10];
    let sizes = [10, 100];

    let mut group = c.benchmark_group("doe");
    group.sample_size(10);
    let unit = aview1(&[0., 1.]);
    let rng = Xoshiro256Plus::seed_from_u64(42);
    for dim in dims {
        let xlimits = unit.broadcast((dim, 2)).unwrap();
        for size in sizes {
            group.bench_function(format!("lhs-maximin-{dim}-dim-{size}-size"), |b| {
                b.iter(|| {
                    std::hint::black_box(
                        Lhs::new(&xlimits)
                            .kind(LhsKind::Maximin)
                            .with_rng(rng.clone())
                            .sample(size),
                    )
                });
            });
        }
    }
    let xlimits = unit.broadcast((2, 2)).unwrap();
    group.bench_function("full-factorial-2-dim-100-levels", |b| {
        b.iter(|| std::hint::black_box(FullFactorial::new(&xlimits).levels(100).sample_grid()));
    });
    group.finish();
}

criterion_group!(benches, criterion_doe);
criterion_main!(benches);
