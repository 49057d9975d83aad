//! Several producer threads, each with its own stable `pid`, feeding one
//! consumer on the main thread.

use std::sync::Arc;
use std::thread;

use reservoir::MpscQueue;

const PRODUCERS: usize = 4;
const PER_PRODUCER: u64 = 25_000;

fn main() {
    let queue = Arc::new(MpscQueue::<u64>::new(4096, PRODUCERS).unwrap());

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|pid| {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    let value = (pid as u64) << 32 | i;
                    while !queue.try_push(pid, value) {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    let total = PRODUCERS as u64 * PER_PRODUCER;
    let mut received = 0u64;
    while received < total {
        if queue.try_pop().is_some() {
            received += 1;
        }
    }

    for h in handles {
        h.join().unwrap();
    }
    println!("consumed {received} values from {PRODUCERS} producers");
}
