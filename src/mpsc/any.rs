//! MPSC-Any: multi-producer, single-consumer ring of variable-length,
//! length-prefixed byte records.

use std::sync::atomic::Ordering;

use crate::backoff::Backoff;
use crate::constants::{MIN_ANY_CAPACITY, WORD_SIZE};
use crate::error::{ReservoirError, Result};
use crate::layout::{AlignedRegion, PaddedPosition};
use crate::registry::{self, Table};
use crate::splice::{copy_elem_into, copy_out_of, read_len_prefix};

pub struct MpscAny {
    head: PaddedPosition,
    tail: PaddedPosition,
    last_head: PaddedPosition,
    capacity: u64,
    table: Table,
    buffer: AlignedRegion,
}

unsafe impl Sync for MpscAny {}

impl MpscAny {
    pub fn new(capacity_bytes: usize, max_producers: usize) -> Result<Self> {
        if capacity_bytes < MIN_ANY_CAPACITY {
            return Err(ReservoirError::config(format!(
                "mpsc-any capacity must be at least {MIN_ANY_CAPACITY} bytes, got {capacity_bytes}"
            )));
        }
        if max_producers == 0 {
            return Err(ReservoirError::config("mpsc-any max_producers must be non-zero"));
        }

        Ok(Self {
            head: PaddedPosition::new(0),
            tail: PaddedPosition::new(0),
            last_head: PaddedPosition::new(0),
            capacity: capacity_bytes as u64,
            table: Table::new(max_producers),
            buffer: AlignedRegion::new(capacity_bytes),
        })
    }

    #[inline]
    fn is_full(&self, need: u64, head: u64, tail: u64) -> bool {
        head + need - 1 >= tail + self.capacity
    }

    #[inline]
    fn is_empty(&self, last_head: u64, tail: u64) -> bool {
        tail >= last_head
    }

    fn reserve_head_to_produce(&self, pid: usize, need: u64) -> Option<u64> {
        let mut backoff = Backoff::exponential();
        let mut head = self.head.value.load(Ordering::Acquire);
        let mut tail = self.tail.value.load(Ordering::Acquire);
        let mut retried = false;

        loop {
            while !self.is_full(need, head, tail) {
                self.table.slot(pid).announce(head);

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

    /// Push `elem` from producer `pid`.
    pub fn try_push(&self, pid: usize, elem: &[u8]) -> bool {
        // Held across both the reservation and the payload write: clearing
        // `announced_head[pid]` before the write lets a concurrent
        // `update_last_head` advance `last_head` past a slot nothing has
        // been written into yet.
        let _guard = self.table.guard(pid);
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

    fn update_last_head(&self, old_last_head: u64) -> u64 {
        let head = self.head.value.load(Ordering::Acquire);
        let candidate = self.table.min_announced(head);
        registry::advance_bound(&self.last_head.value, old_last_head, candidate)
    }

    /// Size of the next unread record, without consuming it.
    pub fn next_element_size(&self) -> Option<usize> {
        let mut last_head = self.last_head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);
        if self.is_empty(last_head, tail) {
            last_head = self.update_last_head(last_head);
            if self.is_empty(last_head, tail) {
                return None;
            }
        }
        let len = unsafe { read_len_prefix(self.buffer.as_ptr(), self.capacity as usize, tail) };
        Some(len as usize)
    }

    /// Pop the next record into `dst`. Returns bytes written, or `None` if
    /// empty.
    pub fn try_pop(&self, dst: &mut [u8]) -> Option<usize> {
        let mut last_head = self.last_head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);

        if self.is_empty(last_head, tail) {
            last_head = self.update_last_head(last_head);
            if self.is_empty(last_head, tail) {
                return None;
            }
        }

        let len =
            unsafe { read_len_prefix(self.buffer.as_ptr(), self.capacity as usize, tail) } as usize;
        let n = dst.len().min(len);
        unsafe {
            copy_out_of(
                self.buffer.as_ptr(),
                self.capacity as usize,
                tail + WORD_SIZE as u64,
                dst.as_mut_ptr(),
                n,
            );
        }
        self.tail.value.store(tail + WORD_SIZE as u64 + len as u64, Ordering::Release);
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
        let tail = self.tail.value.load(Ordering::Acquire);
        self.is_full(WORD_SIZE as u64, head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn reports_sizes_in_fifo_order() {
        let q = MpscAny::new(256, 1).unwrap();
        assert!(q.try_push(0, b"a"));
        assert!(q.try_push(0, b"ab"));
        assert!(q.try_push(0, b"abc"));

        let mut buf = [0u8; 8];
        assert_eq!(q.next_element_size(), Some(1));
        assert_eq!(q.try_pop(&mut buf), Some(1));
        assert_eq!(q.next_element_size(), Some(2));
        assert_eq!(q.try_pop(&mut buf), Some(2));
        assert_eq!(q.next_element_size(), Some(3));
        assert_eq!(q.try_pop(&mut buf), Some(3));
        assert_eq!(q.try_pop(&mut buf), None);
    }

    #[test]
    fn many_producers_each_record_delivered_once() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 5_000;

        let q = Arc::new(MpscAny::new(1 << 16, PRODUCERS).unwrap());
        let mut handles = Vec::new();
        for pid in 0..PRODUCERS {
            let q = q.clone();
            handles.push(thread::spawn(move || {
                let mut sent = 0usize;
                while sent < PER_PRODUCER {
                    let payload = format!("p{pid}-{sent}");
                    if q.try_push(pid, payload.as_bytes()) {
                        sent += 1;
                    }
                }
            }));
        }

        let total = PRODUCERS * PER_PRODUCER;
        let mut received = 0usize;
        let mut seen = HashSet::new();
        let mut buf = [0u8; 64];
        while received < total {
            if let Some(n) = q.try_pop(&mut buf) {
                let s = String::from_utf8(buf[..n].to_vec()).unwrap();
                assert!(seen.insert(s), "duplicate record");
                received += 1;
            }
        }

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(seen.len(), total);
    }
}
