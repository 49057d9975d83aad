//! Integration tests for the SPSC / SPSC-Any queue flavors.

use std::sync::Arc;
use std::thread;

use reservoir::{SpscAny, SpscQueue};

#[test]
fn typed_rejects_bad_capacity() {
    assert!(SpscQueue::<u64>::new(0).is_err());
    assert!(SpscQueue::<u64>::new(3).is_err());
}

#[test]
fn typed_single_thread_fifo() {
    let q = SpscQueue::<u32>::new(8).unwrap();
    for i in 0..8u32 {
        assert!(q.try_push(i));
    }
    assert!(!q.try_push(999));
    for i in 0..8u32 {
        assert_eq!(q.try_pop(), Some(i));
    }
    assert_eq!(q.try_pop(), None);
}

#[test]
fn typed_producer_consumer_threads_preserve_order() {
    const N: u64 = 200_000;
    let q = Arc::new(SpscQueue::<u64>::new(256).unwrap());

    let producer = {
        let q = q.clone();
        thread::spawn(move || {
            let mut next = 0u64;
            while next < N {
                if q.try_push(next) {
                    next += 1;
                }
            }
        })
    };

    let mut expected = 0u64;
    while expected < N {
        if let Some(v) = q.try_pop() {
            assert_eq!(v, expected);
            expected += 1;
        }
    }
    producer.join().unwrap();
}

#[test]
fn any_variable_length_records_round_trip_through_wraparound() {
    let q = SpscAny::new(64).unwrap();
    let mut out = [0u8; 32];

    for round in 0..50u8 {
        let payload: Vec<u8> = (0..(round % 13) + 1).map(|i| i ^ round).collect();
        assert!(q.try_push(&payload), "push failed at round {round}");
        assert_eq!(q.next_element_size(), Some(payload.len()));
        let n = q.try_pop(&mut out).unwrap();
        assert_eq!(&out[..n], payload.as_slice());
    }
}

#[test]
fn any_producer_consumer_threads_preserve_bytes_and_order() {
    const N: usize = 50_000;
    let q = Arc::new(SpscAny::new(1 << 14).unwrap());

    let producer = {
        let q = q.clone();
        thread::spawn(move || {
            let mut sent = 0usize;
            while sent < N {
                let payload = format!("rec-{sent}");
                if q.try_push(payload.as_bytes()) {
                    sent += 1;
                }
            }
        })
    };

    let mut received = 0usize;
    let mut buf = [0u8; 32];
    while received < N {
        if let Some(n) = q.try_pop(&mut buf) {
            let expected = format!("rec-{received}");
            assert_eq!(&buf[..n], expected.as_bytes());
            received += 1;
        }
    }
    producer.join().unwrap();
}
