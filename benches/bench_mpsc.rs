//! MPSC/MPSC-Any throughput under a fixed producer count, single consumer.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use reservoir::{MpscAny, MpscQueue};

fn bench_typed_by_producer_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpsc_typed");
    for producers in [1usize, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("push_pop", producers),
            &producers,
            |b, &producers| {
                let q = MpscQueue::<u64>::new(4096, producers).unwrap();
                let mut pid = 0usize;
                b.iter(|| {
                    while !q.try_push(pid, 1) {
                        let _ = q.try_pop();
                    }
                    pid = (pid + 1) % producers;
                    black_box(q.try_pop());
                });
            },
        );
    }
    group.finish();
}

fn bench_any_by_producer_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpsc_any");
    let payload = vec![0x42u8; 32];
    for producers in [1usize, 4] {
        group.bench_with_input(
            BenchmarkId::new("push_pop_32b", producers),
            &producers,
            |b, &producers| {
                let q = MpscAny::new(1 << 17, producers).unwrap();
                let mut buf = [0u8; 64];
                let mut pid = 0usize;
                b.iter(|| {
                    while !q.try_push(pid, &payload) {
                        let _ = q.try_pop(&mut buf);
                    }
                    pid = (pid + 1) % producers;
                    black_box(q.try_pop(&mut buf));
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_typed_by_producer_count, bench_any_by_producer_count);
criterion_main!(benches);
