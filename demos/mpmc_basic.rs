//! A pool of producer threads and a pool of consumer threads sharing one
//! MPMC-Any ring, each consumer tallying how many records it personally
//! drained.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use reservoir::MpmcAny;

const PRODUCERS: usize = 3;
const CONSUMERS: usize = 3;
const PER_PRODUCER: usize = 20_000;

fn main() {
    let queue = Arc::new(MpmcAny::new(1 << 18, PRODUCERS.max(CONSUMERS)).unwrap());
    let total = PRODUCERS * PER_PRODUCER;
    let drained = Arc::new(AtomicUsize::new(0));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|pid| {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    let payload = format!("producer{pid}-record{i}");
                    while !queue.try_push(pid, payload.as_bytes()) {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|cid| {
            let queue = queue.clone();
            let drained = drained.clone();
            thread::spawn(move || {
                let mut buf = [0u8; 64];
                let mut mine = 0usize;
                loop {
                    if queue.try_pop(cid, &mut buf).is_some() {
                        mine += 1;
                        if drained.fetch_add(1, Ordering::SeqCst) + 1 >= total {
                            return mine;
                        }
                    } else if drained.load(Ordering::SeqCst) >= total {
                        return mine;
                    }
                }
            })
        })
        .collect();

    for h in producers {
        h.join().unwrap();
    }
    for (cid, h) in consumers.into_iter().enumerate() {
        println!("consumer {cid} drained {} records", h.join().unwrap());
    }
}
