use aerogp_doe::{Lhs, SamplingMethod};
use aerogp_gp::{GpParams, Smoothness, SmoothnessTuning};
use criterion::{Criterion, criterion_group, criterion_main};
use linfa::prelude::{Dataset, Fit};
use ndarray::{Array1, Zip, array};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

fn criterion_gp(c: &mut Criterion) {
    let dims = [2, 5];
    let nts = [50, 100];

    let mut group = c.benchmark_group("gp");
    group.sample_size(10);
    for (dim, nt) in dims.into_iter().zip(nts) {
        let griewank = |x: &Array1<f64>| -> f64 {
            let d = Array1::linspace(1., dim as f64, dim).mapv(|v| v.sqrt());
            x.mapv(|v| v * v).sum() / 4000. - (x / &d).mapv(|v| v.cos()).fold(1., |acc, x| acc * x)
                + 1.0
        };
        let lim = array![[-5., 5.]];
        let xlimits = lim.broadcast((dim, 2)).unwrap();
        let rng = Xoshiro256Plus::seed_from_u64(42);
        let xt = Lhs::new(&xlimits).with_rng(rng).sample(nt);
        let mut yt: Array1<f64> = Array1::zeros(xt.nrows());
        Zip::from(&mut yt).and(xt.rows()).par_for_each(|y, x| {
            *y = griewank(&x.to_owned());
        });

        for n_start in [0, 4] {
            group.bench_function(format!("gp-matern52-{dim}-dim-{n_start}-restarts"), |b| {
                b.iter(|| {
                    std::hint::black_box(
                        GpParams::new((1e-2, 1e2), (1e-6, 1e-2))
                            .smoothness(SmoothnessTuning::Fixed(Smoothness::Matern52))
                            .n_start(n_start)
                            .seed(Some(42))
                            .fit(&Dataset::new(xt.to_owned(), yt.to_owned()))
                            .expect("GP fit error"),
                    )
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, criterion_gp);
criterion_main!(benches);
