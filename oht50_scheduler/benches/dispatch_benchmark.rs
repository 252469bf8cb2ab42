use criterion::{criterion_group, criterion_main, Criterion};
use oht50_scheduler::{Priority, Scheduler};
use std::sync::Arc;

fn bench_add_task(c: &mut Criterion) {
    c.bench_function("scheduler_add_task", |b| {
        let scheduler = Arc::new(Scheduler::new(64, 1_000, false));
        let mut n = 0u32;
        b.iter(|| {
            n += 1;
            let _ = scheduler.add_task(
                format!("bench-{n}"),
                Box::new(|| {}),
                Priority::Low,
                10_000,
                10_000,
            );
        });
    });
}

criterion_group!(benches, bench_add_task);
criterion_main!(benches);
