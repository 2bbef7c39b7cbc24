//! Operator generation benchmarks

use arithgen_netlist::{GenerationContext, Simulator};
use arithgen_ops::bitheap::CompressorSearch;
use arithgen_ops::kcm::{FixRealKcm, FixRealKcmParams};
use arithgen_ops::multi_adder::IntMultiAdder;
use arithgen_target::Target;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

fn benchmark_kcm_generation(c: &mut Criterion) {
    let target = Target::virtex5();
    let mut group = c.benchmark_group("kcm_generation");
    group.measurement_time(Duration::from_secs(10));

    for w in [8, 16, 32, 64] {
        for use_bit_heap in [true, false] {
            let label = format!("{}_{}", w, if use_bit_heap { "heap" } else { "rake" });
            let params = FixRealKcmParams::new(0, w - 1, false, 0, "sqrt(2)/3").with_bit_heap(use_bit_heap);
            group.bench_with_input(BenchmarkId::from_parameter(label), &params, |b, params| {
                b.iter(|| {
                    let mut ctx = GenerationContext::new();
                    let kcm = FixRealKcm::new(&target, &mut ctx, params).unwrap();
                    black_box(kcm.layout().tables.len())
                });
            });
        }
    }
    group.finish();
}

fn benchmark_compressor_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("compressor_search");

    for max_inputs in [3, 4, 6] {
        group.bench_with_input(BenchmarkId::from_parameter(max_inputs), &max_inputs, |b, &k| {
            b.iter(|| {
                let mut search = CompressorSearch::new(k);
                let cost: u64 = (1..=64).map(|n| search.best(black_box(n)).cost).sum();
                black_box(cost)
            });
        });
    }
    group.finish();
}

fn benchmark_multi_adder_simulation(c: &mut Criterion) {
    let target = Target::virtex5();
    let mut ctx = GenerationContext::new();
    let adder = IntMultiAdder::new(&target, &mut ctx, 8, 64, None).unwrap();
    let component = ctx.component(adder.name()).unwrap();
    let names: Vec<String> = (0..8).map(|i| format!("X{i}")).collect();

    c.bench_function("multi_adder_simulation", |b| {
        b.iter(|| {
            let mut inputs: Vec<(&str, u128)> = names
                .iter()
                .enumerate()
                .map(|(i, n)| (n.as_str(), 0x0123_4567_89ab_cdef_u128 * (i as u128 + 1) & u64::MAX as u128))
                .collect();
            inputs.push(("Cin", 1));
            let out = Simulator::new(&ctx).run_u128(component, &inputs).unwrap();
            black_box(out["R"])
        });
    });
}

criterion_group!(
    benches,
    benchmark_kcm_generation,
    benchmark_compressor_search,
    benchmark_multi_adder_simulation
);
criterion_main!(benches);
