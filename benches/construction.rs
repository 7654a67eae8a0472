use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use taguchi_doe::config::Limits;
use taguchi_doe::construct::{AddelmanKempthorne, Bose, Bush, Constructor, Hadamard, RaoHamming};
use taguchi_doe::gf::Field;
use taguchi_doe::OABuilder;

fn bench_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("Field");

    for q in [7u32, 16, 25, 49, 256] {
        group.bench_with_input(BenchmarkId::new("tables", q), &q, |b, &q| {
            b.iter(|| Field::new(q).unwrap());
        });

        let field = Field::new(q).unwrap();
        group.bench_with_input(BenchmarkId::new("mul_chain", q), &field, |b, field| {
            b.iter(|| {
                let mut acc = 1;
                for v in 1..field.order() {
                    acc = field.mul(acc, black_box(v));
                }
                acc
            });
        });
    }
    group.finish();
}

fn bench_bose(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bose");

    for q in [3u32, 5, 7, 11, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(q), &q, |b, &q| {
            let bose = Bose::try_new(q).unwrap();
            let factors = bose.max_factors();
            b.iter(|| bose.construct(factors).unwrap());
        });
    }
    group.finish();
}

fn bench_bush(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bush_Strength3");

    for q in [3u32, 5, 7] {
        group.bench_with_input(BenchmarkId::from_parameter(q), &q, |b, &q| {
            let bush = Bush::try_new(q, 3).unwrap();
            let factors = bush.max_factors();
            b.iter(|| bush.construct(factors).unwrap());
        });
    }
    group.finish();
}

fn bench_hadamard(c: &mut Criterion) {
    let mut group = c.benchmark_group("Hadamard");

    // Sylvester, Paley I, Paley II
    for order in [64usize, 44, 36] {
        group.bench_with_input(BenchmarkId::from_parameter(order), &order, |b, &order| {
            let hadamard = Hadamard::try_new(order).unwrap();
            b.iter(|| hadamard.construct(order - 1).unwrap());
        });
    }
    group.finish();
}

fn bench_rao_hamming(c: &mut Criterion) {
    let mut group = c.benchmark_group("RaoHamming");

    for (q, m) in [(2u32, 4u32), (2, 6), (3, 4)] {
        group.bench_with_input(BenchmarkId::new(format!("q{q}"), m), &m, |b, &m| {
            let rh = RaoHamming::try_new(q, m).unwrap();
            let factors = rh.max_factors();
            b.iter(|| rh.construct(factors).unwrap());
        });
    }
    group.finish();
}

fn bench_addelman(c: &mut Criterion) {
    let mut group = c.benchmark_group("AddelmanKempthorne");

    for s in [3u32, 5, 7] {
        group.bench_with_input(BenchmarkId::from_parameter(s), &s, |b, &s| {
            let ak = AddelmanKempthorne::try_new(s, 1).unwrap();
            let factors = ak.max_factors();
            b.iter(|| ak.construct(factors).unwrap());
        });
    }
    group.finish();
}

fn bench_builder_auto(c: &mut Criterion) {
    let mut group = c.benchmark_group("Builder_Auto");

    // L9: should use Bose
    group.bench_function("L9", |b| {
        b.iter(|| OABuilder::new().levels(3).factors(4).strength(2).build().unwrap());
    });

    // L16: should use Hadamard
    group.bench_function("L16_Hadamard", |b| {
        b.iter(|| OABuilder::new().levels(2).factors(15).strength(2).build().unwrap());
    });

    // 2^3 4^1 by collapsing a 4-level Bose array
    group.bench_function("Mixed_Collapse", |b| {
        b.iter(|| OABuilder::new().mixed_levels(vec![2, 2, 2, 4]).build().unwrap());
    });

    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("Verify");
    let limits = Limits::default();

    for q in [5u32, 7, 11] {
        let oa = Bose::try_new(q).unwrap().construct(q as usize + 1).unwrap();
        group.bench_with_input(BenchmarkId::new("bose", q), &oa, |b, oa| {
            b.iter(|| oa.verify(&limits).unwrap());
        });
    }

    let l64 = Hadamard::try_new(64).unwrap().construct(63).unwrap();
    group.bench_function("hadamard64", |b| b.iter(|| l64.verify(&limits).unwrap()));

    group.finish();
}

criterion_group!(
    benches,
    bench_field,
    bench_bose,
    bench_bush,
    bench_hadamard,
    bench_rao_hamming,
    bench_addelman,
    bench_builder_auto,
    bench_verify
);
criterion_main!(benches);
