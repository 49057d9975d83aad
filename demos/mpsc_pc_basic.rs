//! Per-CPU-sharded MPSC: several producer threads with no explicit `pid`
//! (the shard is derived from whatever CPU each thread happens to run on),
//! one consumer draining round-robin across shards.

use std::sync::Arc;
use std::thread;

use reservoir::MpscPcQueue;

const PRODUCERS: usize = 4;
const PER_PRODUCER: usize = 10_000;

fn main() {
    if !MpscPcQueue::available() {
        eprintln!("rseq not available on this kernel; MPSC-PC push correctness is not guaranteed");
    }

    let queue = Arc::new(MpscPcQueue::new(1 << 16).unwrap());
    println!("sharded across {} CPUs", queue.num_shards());

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|pid| {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    let payload = format!("p{pid}-{i}");
                    while !queue.try_push(payload.as_bytes()) {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    let total = PRODUCERS * PER_PRODUCER;
    let mut received = 0usize;
    let mut buf = [0u8; 32];
    while received < total {
        if queue.try_pop(&mut buf).is_some() {
            received += 1;
        }
    }

    for h in handles {
        h.join().unwrap();
    }
    println!("drained {received} records");
}
