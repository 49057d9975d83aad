//! MPMC/MPMC-Any throughput under varying participant counts.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use reservoir::{MpmcAny, MpmcQueue};

fn bench_typed_by_participant_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpmc_typed");
    for participants in [1usize, 2, 4] {
        group.bench_with_input(
            BenchmarkId::new("push_pop", participants),
            &participants,
            |b, &participants| {
                let q = MpmcQueue::<u64>::new(4096, participants).unwrap();
                b.iter(|| {
                    while !q.try_push(0, 1) {
                        let _ = q.try_pop(0);
                    }
                    black_box(q.try_pop(0));
                });
            },
        );
    }
    group.finish();
}

fn bench_any_by_participant_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpmc_any");
    let payload = vec![0x7fu8; 48];
    for participants in [1usize, 4] {
        group.bench_with_input(
            BenchmarkId::new("push_pop_48b", participants),
            &participants,
            |b, &participants| {
                let q = MpmcAny::new(1 << 17, participants).unwrap();
                let mut buf = [0u8; 64];
                b.iter(|| {
                    while !q.try_push(0, &payload) {
                        let _ = q.try_pop(0, &mut buf);
                    }
                    black_box(q.try_pop(0, &mut buf));
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_typed_by_participant_count, bench_any_by_participant_count);
criterion_main!(benches);
