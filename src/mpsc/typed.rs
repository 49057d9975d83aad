//! Typed MPSC ring buffer.

use std::sync::atomic::Ordering;

use bytemuck::Pod;

use crate::backoff::Backoff;
use crate::error::{ReservoirError, Result};
use crate::layout::PaddedPosition;
use crate::registry::{self, Table};

/// A bounded multi-producer/single-consumer ring of fixed-size,
/// trivially-copyable values.
///
/// Each producer is identified by a caller-supplied stable `pid` in
/// `[0, max_producers)` — presenting the same `pid` from two
/// concurrently-running threads is a contract violation.
pub struct MpscQueue<T: Pod + Send> {
    head: PaddedPosition,
    tail: PaddedPosition,
    last_head: PaddedPosition,
    capacity: u64,
    mask: u64,
    table: Table,
    buffer: Box<[T]>,
}

unsafe impl<T: Pod + Send> Sync for MpscQueue<T> {}

impl<T: Pod + Send> MpscQueue<T> {
    pub fn new(capacity: usize, max_producers: usize) -> Result<Self> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(ReservoirError::config(format!(
                "mpsc capacity must be a non-zero power of two, got {capacity}"
            )));
        }
        if max_producers == 0 {
            return Err(ReservoirError::config("mpsc max_producers must be non-zero"));
        }

        Ok(Self {
            head: PaddedPosition::new(0),
            tail: PaddedPosition::new(0),
            last_head: PaddedPosition::new(0),
            capacity: capacity as u64,
            mask: capacity as u64 - 1,
            table: Table::new(max_producers),
            buffer: vec![T::zeroed(); capacity].into_boxed_slice(),
        })
    }

    #[inline]
    fn is_full(&self, head: u64, tail: u64) -> bool {
        head >= tail + self.capacity
    }

    #[inline]
    fn is_empty(&self, last_head: u64, tail: u64) -> bool {
        tail >= last_head
    }

    /// Reserve one slot for producer `pid`. Retries under CAS contention;
    /// on observed fullness, rereads the real `tail` once before giving up
    /// — cheap enough with a single consumer that no cached bound is kept.
    fn reserve_head_to_produce(&self, pid: usize) -> Option<u64> {
        let mut backoff = Backoff::exponential();
        let mut head = self.head.value.load(Ordering::Acquire);
        let mut tail = self.tail.value.load(Ordering::Acquire);
        let mut retried = false;

        loop {
            while !self.is_full(head, tail) {
                self.table.slot(pid).announce(head);

                match self.head.value.compare_exchange(
                    head,
                    head + 1,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                ) {
                    Ok(_) => return Some(head),
                    Err(actual) => {
                        head = actual;
                        backoff.spin();
                        tail = self.tail.value.load(Ordering::Acquire);
                    }
                }
            }

            if retried {
                return None;
            }
            retried = true;
            tail = self.tail.value.load(Ordering::Acquire);
        }
    }

    /// Push `v` from producer `pid`. Returns `false` ("would block") if the
    /// ring is observed full after one retry.
    pub fn try_push(&self, pid: usize, v: T) -> bool {
        // Held across both the reservation and the slot write: clearing
        // `announced_head[pid]` before the write lets a concurrent
        // `update_last_head` advance `last_head` past a slot nothing has
        // been written into yet.
        let _guard = self.table.guard(pid);
        match self.reserve_head_to_produce(pid) {
            Some(head) => {
                let idx = (head & self.mask) as usize;
                // Safety: this producer exclusively owns the slot it just
                // reserved via CAS until `head` (already bumped) is visible.
                unsafe {
                    let slot = self.buffer.as_ptr().add(idx) as *mut T;
                    slot.write(v);
                }
                true
            }
            None => false,
        }
    }

    fn update_last_head(&self, old_last_head: u64) -> u64 {
        let head = self.head.value.load(Ordering::Acquire);
        let candidate = self.table.min_announced(head);
        registry::advance_bound(&self.last_head.value, old_last_head, candidate)
    }

    /// Pop the oldest element. Returns `None` ("would block") if empty.
    pub fn try_pop(&self) -> Option<T> {
        let mut last_head = self.last_head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);

        if self.is_empty(last_head, tail) {
            last_head = self.update_last_head(last_head);
            if self.is_empty(last_head, tail) {
                return None;
            }
        }

        let v = self.buffer[(tail & self.mask) as usize];
        self.tail.value.store(tail + 1, Ordering::Release);
        Some(v)
    }

    pub fn is_queue_empty(&self) -> bool {
        let last_head = self.last_head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);
        if self.is_empty(last_head, tail) {
            let last_head = self.update_last_head(last_head);
            return self.is_empty(last_head, tail);
        }
        false
    }

    pub fn is_queue_full(&self) -> bool {
        let head = self.head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);
        self.is_full(head, tail)
    }

    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn single_producer_round_trips_in_order() {
        let q = MpscQueue::<u64>::new(4, 1).unwrap();
        assert!(q.try_push(0, 1));
        assert!(q.try_push(0, 2));
        assert!(q.try_push(0, 3));
        assert_eq!(q.try_pop(), Some(1));
        assert_eq!(q.try_pop(), Some(2));
        assert_eq!(q.try_pop(), Some(3));
        assert_eq!(q.try_pop(), None);
    }

    #[test]
    fn full_at_capacity_then_rejects() {
        let q = MpscQueue::<u32>::new(2, 1).unwrap();
        assert!(q.try_push(0, 1));
        assert!(q.try_push(0, 2));
        assert!(!q.try_push(0, 3));
    }

    #[test]
    fn many_producers_deliver_every_item_exactly_once() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: u64 = 20_000;

        let q = Arc::new(MpscQueue::<u64>::new(1024, PRODUCERS).unwrap());
        let mut handles = Vec::new();
        for pid in 0..PRODUCERS {
            let q = q.clone();
            handles.push(thread::spawn(move || {
                let mut sent = 0u64;
                while sent < PER_PRODUCER {
                    if q.try_push(pid, pid as u64 * 1_000_000 + sent) {
                        sent += 1;
                    }
                }
            }));
        }

        let mut received = 0u64;
        let total = PRODUCERS as u64 * PER_PRODUCER;
        let mut seen = std::collections::HashSet::new();
        while received < total {
            if let Some(v) = q.try_pop() {
                assert!(seen.insert(v), "duplicate delivery of {v}");
                received += 1;
            }
        }

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(seen.len(), total as usize);
    }
}
