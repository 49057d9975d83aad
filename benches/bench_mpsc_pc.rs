//! Per-CPU-sharded MPSC throughput — the flavor that trades off an
//! announced-position table for CPU-derived shard addressing.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use reservoir::MpscPcQueue;

fn bench_single_shard_push_pop(c: &mut Criterion) {
    if !MpscPcQueue::available() {
        eprintln!("skipping bench_mpsc_pc: rseq unavailable on this kernel");
        return;
    }

    let q = MpscPcQueue::new(1 << 16).unwrap();
    let payload = vec![0x11u8; 32];
    let mut buf = [0u8; 64];

    c.bench_function("mpsc_pc_push_pop_32b", |b| {
        b.iter(|| {
            while !q.try_push(&payload) {
                let _ = q.try_pop(&mut buf);
            }
            black_box(q.try_pop(&mut buf));
        });
    });
}

criterion_group!(benches, bench_single_shard_push_pop);
criterion_main!(benches);
