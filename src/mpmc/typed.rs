//! Typed MPMC ring buffer.

use std::sync::atomic::Ordering;

use bytemuck::Pod;

use crate::backoff::Backoff;
use crate::error::{ReservoirError, Result};
use crate::layout::PaddedPosition;
use crate::registry::{self, Table};

/// A bounded multi-producer/multi-consumer ring of fixed-size,
/// trivially-copyable values.
///
/// Producers and consumers each present a stable `pid` in
/// `[0, max_participants)` indexing their own announcement slot; a
/// producer's and a consumer's `pid` address different tables, so the same
/// numeric id may safely be reused by one of each.
pub struct MpmcQueue<T: Pod + Send> {
    head: PaddedPosition,
    tail: PaddedPosition,
    last_head: PaddedPosition,
    last_tail: PaddedPosition,
    capacity: u64,
    mask: u64,
    head_table: Table,
    tail_table: Table,
    buffer: Box<[T]>,
}

unsafe impl<T: Pod + Send> Sync for MpmcQueue<T> {}

impl<T: Pod + Send> MpmcQueue<T> {
    pub fn new(capacity: usize, max_participants: usize) -> Result<Self> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(ReservoirError::config(format!(
                "mpmc capacity must be a non-zero power of two, got {capacity}"
            )));
        }
        if max_participants == 0 {
            return Err(ReservoirError::config("mpmc max_participants must be non-zero"));
        }

        Ok(Self {
            head: PaddedPosition::new(0),
            tail: PaddedPosition::new(0),
            last_head: PaddedPosition::new(0),
            last_tail: PaddedPosition::new(0),
            capacity: capacity as u64,
            mask: capacity as u64 - 1,
            head_table: Table::new(max_participants),
            tail_table: Table::new(max_participants),
            buffer: vec![T::zeroed(); capacity].into_boxed_slice(),
        })
    }

    #[inline]
    fn is_full(&self, head: u64, tail: u64) -> bool {
        head >= tail + self.capacity
    }

    #[inline]
    fn is_empty(&self, head: u64, tail: u64) -> bool {
        tail >= head
    }

    fn update_last_tail(&self, old_last_tail: u64) -> u64 {
        let tail = self.tail.value.load(Ordering::Acquire);
        let candidate = self.tail_table.min_announced(tail);
        registry::advance_bound(&self.last_tail.value, old_last_tail, candidate)
    }

    fn update_last_head(&self, old_last_head: u64) -> u64 {
        let head = self.head.value.load(Ordering::Acquire);
        let candidate = self.head_table.min_announced(head);
        registry::advance_bound(&self.last_head.value, old_last_head, candidate)
    }

    fn reserve_head_to_produce(&self, pid: usize) -> Option<u64> {
        let mut backoff = Backoff::exponential();
        let mut head = self.head.value.load(Ordering::Acquire);
        let mut last_tail = self.last_tail.value.load(Ordering::Acquire);
        let mut retried = false;

        loop {
            while !self.is_full(head, last_tail) {
                self.head_table.slot(pid).announce(head);

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
                        last_tail = self.last_tail.value.load(Ordering::Acquire);
                    }
                }
            }

            if retried {
                return None;
            }
            retried = true;
            last_tail = self.update_last_tail(last_tail);
        }
    }

    fn reserve_tail_to_consume(&self, pid: usize) -> Option<u64> {
        let mut backoff = Backoff::exponential();
        let mut last_head = self.last_head.value.load(Ordering::Acquire);
        let mut tail = self.tail.value.load(Ordering::Acquire);
        let mut retried = false;

        loop {
            while !self.is_empty(last_head, tail) {
                self.tail_table.slot(pid).announce(tail);

                match self.tail.value.compare_exchange(
                    tail,
                    tail + 1,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                ) {
                    Ok(_) => return Some(tail),
                    Err(actual) => {
                        tail = actual;
                        backoff.spin();
                        last_head = self.last_head.value.load(Ordering::Acquire);
                    }
                }
            }

            if retried {
                return None;
            }
            retried = true;
            last_head = self.update_last_head(last_head);
        }
    }

    /// Push `v` from producer `pid`.
    pub fn try_push(&self, pid: usize, v: T) -> bool {
        // Held across both the reservation and the slot write: clearing
        // `announced_head[pid]` before the write lets a concurrent
        // `update_last_head` advance `last_head` past a slot nothing has
        // been written into yet.
        let _guard = self.head_table.guard(pid);
        match self.reserve_head_to_produce(pid) {
            Some(head) => {
                let idx = (head & self.mask) as usize;
                // Safety: this producer exclusively owns the slot it just
                // reserved via CAS.
                unsafe {
                    let slot = self.buffer.as_ptr().add(idx) as *mut T;
                    slot.write(v);
                }
                true
            }
            None => false,
        }
    }

    /// Pop into `pid`'s reserved slot.
    pub fn try_pop(&self, pid: usize) -> Option<T> {
        // Held across both the reservation and the slot read: clearing
        // `announced_tail[pid]` before the read lets a concurrent producer
        // overwrite a slot this consumer hasn't finished reading yet.
        let _guard = self.tail_table.guard(pid);
        self.reserve_tail_to_consume(pid).map(|tail| self.buffer[(tail & self.mask) as usize])
    }

    pub fn is_queue_empty(&self) -> bool {
        let mut last_head = self.last_head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);
        if self.is_empty(last_head, tail) {
            last_head = self.update_last_head(last_head);
            return self.is_empty(last_head, tail);
        }
        false
    }

    pub fn is_queue_full(&self) -> bool {
        let head = self.head.value.load(Ordering::Acquire);
        let mut last_tail = self.last_tail.value.load(Ordering::Acquire);
        if self.is_full(head, last_tail) {
            last_tail = self.update_last_tail(last_tail);
            return self.is_full(head, last_tail);
        }
        false
    }

    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }
}
