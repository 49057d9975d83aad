//! Minimal single-producer/single-consumer walkthrough: one thread pushes,
//! the main thread drains, using `WaitEvent` to avoid busy-spinning on an
//! empty queue.

use std::sync::Arc;
use std::thread;

use reservoir::wait_event::WaitEvent;
use reservoir::SpscQueue;

fn main() {
    let queue = Arc::new(SpscQueue::<u64>::new(1024).unwrap());
    let not_empty = Arc::new(WaitEvent::new());

    let producer_queue = queue.clone();
    let producer_event = not_empty.clone();
    let producer = thread::spawn(move || {
        for i in 0..10_000u64 {
            while !producer_queue.try_push(i) {
                thread::yield_now();
            }
            producer_event.wakeup_one();
        }
    });

    let mut received = 0u64;
    while received < 10_000 {
        not_empty.wait(|| !queue.is_queue_empty());
        while let Some(v) = queue.try_pop() {
            received = v + 1;
        }
    }

    producer.join().unwrap();
    println!("drained {received} values");
}
