//! MPMC-Any: multi-producer, multi-consumer ring of variable-length,
//! length-prefixed byte records.

use std::sync::atomic::Ordering;

use crate::backoff::Backoff;
use crate::constants::{MIN_ANY_CAPACITY, WORD_SIZE};
use crate::error::{ReservoirError, Result};
use crate::layout::{AlignedRegion, PaddedPosition};
use crate::registry::{self, Table};
use crate::splice::{copy_elem_into, copy_out_of, read_len_prefix};

pub struct MpmcAny {
    head: PaddedPosition,
    tail: PaddedPosition,
    last_head: PaddedPosition,
    last_tail: PaddedPosition,
    capacity: u64,
    head_table: Table,
    tail_table: Table,
    buffer: AlignedRegion,
}

unsafe impl Sync for MpmcAny {}

impl MpmcAny {
    pub fn new(capacity_bytes: usize, max_participants: usize) -> Result<Self> {
        if capacity_bytes < MIN_ANY_CAPACITY {
            return Err(ReservoirError::config(format!(
                "mpmc-any capacity must be at least {MIN_ANY_CAPACITY} bytes, got {capacity_bytes}"
            )));
        }
        if max_participants == 0 {
            return Err(ReservoirError::config("mpmc-any max_participants must be non-zero"));
        }

        Ok(Self {
            head: PaddedPosition::new(0),
            tail: PaddedPosition::new(0),
            last_head: PaddedPosition::new(0),
            last_tail: PaddedPosition::new(0),
            capacity: capacity_bytes as u64,
            head_table: Table::new(max_participants),
            tail_table: Table::new(max_participants),
            buffer: AlignedRegion::new(capacity_bytes),
        })
    }

    #[inline]
    fn is_full(&self, need: u64, head: u64, tail: u64) -> bool {
        head + need - 1 >= tail + self.capacity
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

    fn reserve_head_to_produce(&self, pid: usize, need: u64) -> Option<u64> {
        let mut backoff = Backoff::exponential();
        let mut head = self.head.value.load(Ordering::Acquire);
        let mut last_tail = self.last_tail.value.load(Ordering::Acquire);
        let mut retried = false;

        loop {
            while !self.is_full(need, head, last_tail) {
                self.head_table.slot(pid).announce(head);

                match self.head.value.compare_exchange(
                    head,
                    head + need,
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

    /// Reserve exactly one record-length's worth of tail space, given its
    /// length prefix has already been observed by the caller.
    fn reserve_tail_to_consume(&self, pid: usize, need: u64) -> Option<u64> {
        let mut backoff = Backoff::exponential();
        let mut last_head = self.last_head.value.load(Ordering::Acquire);
        let mut tail = self.tail.value.load(Ordering::Acquire);
        let mut retried = false;

        loop {
            while !self.is_empty(last_head, tail + need - 1) {
                self.tail_table.slot(pid).announce(tail);

                match self.tail.value.compare_exchange(
                    tail,
                    tail + need,
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

    /// Push `elem` from producer `pid`.
    pub fn try_push(&self, pid: usize, elem: &[u8]) -> bool {
        // Held across both the reservation and the payload write: clearing
        // `announced_head[pid]` before the write lets a concurrent
        // `update_last_head` advance `last_head` past a slot nothing has
        // been written into yet.
        let _guard = self.head_table.guard(pid);
        let need = (elem.len() + WORD_SIZE) as u64;
        match self.reserve_head_to_produce(pid, need) {
            Some(head) => {
                unsafe {
                    copy_elem_into(
                        self.buffer.as_ptr() as *mut u8,
                        self.capacity as usize,
                        head,
                        elem.as_ptr(),
                        elem.len(),
                    );
                }
                true
            }
            None => false,
        }
    }

    /// Pop into `pid`'s reserved record. Each consumer peeks the length of
    /// the next unconsumed record, then atomically reserves exactly that
    /// many bytes of tail space — two steps are required since, unlike
    /// MPSC, a concurrent consumer could otherwise race to read a record
    /// whose length a producer has not finished writing.
    pub fn try_pop(&self, pid: usize, dst: &mut [u8]) -> Option<usize> {
        let mut last_head = self.last_head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);
        if self.is_empty(last_head, tail) {
            last_head = self.update_last_head(last_head);
            if self.is_empty(last_head, tail) {
                return None;
            }
        }

        let len = unsafe { read_len_prefix(self.buffer.as_ptr(), self.capacity as usize, tail) };
        let need = WORD_SIZE as u64 + len;

        // Held across both the reservation and the payload read: clearing
        // `announced_tail[pid]` before the read lets a concurrent producer
        // overwrite a slot this consumer hasn't finished reading yet.
        let _guard = self.tail_table.guard(pid);
        let reserved_tail = self.reserve_tail_to_consume(pid, need)?;
        let n = dst.len().min(len as usize);
        unsafe {
            copy_out_of(
                self.buffer.as_ptr(),
                self.capacity as usize,
                reserved_tail + WORD_SIZE as u64,
                dst.as_mut_ptr(),
                n,
            );
        }
        Some(n)
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
        if self.is_full(WORD_SIZE as u64, head, last_tail) {
            last_tail = self.update_last_tail(last_tail);
            return self.is_full(WORD_SIZE as u64, head, last_tail);
        }
        false
    }
}
