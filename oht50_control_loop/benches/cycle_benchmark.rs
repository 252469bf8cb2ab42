use criterion::{criterion_group, criterion_main, Criterion};
use oht50_control_loop::ControlLoop;

fn bench_empty_cycle(c: &mut Criterion) {
    c.bench_function("control_loop_cycle_no_hooks", |b| {
        let control_loop = ControlLoop::new(1_000, 1_000, 1_000);
        control_loop.enable_latency_measurement(true);
        b.iter(|| {
            control_loop.get_stats();
        });
    });
}

criterion_group!(benches, bench_empty_cycle);
criterion_main!(benches);
