//! Typed SPSC ring buffer.

use std::sync::atomic::Ordering;

use bytemuck::Pod;

use crate::error::{ReservoirError, Result};
use crate::layout::PaddedPosition;

/// A bounded single-producer/single-consumer ring carrying fixed-size,
/// trivially-copyable values. `head` is written only by the producer,
/// `tail` only by the consumer; each lives on its own cache line.
pub struct SpscQueue<T: Pod + Send> {
    head: PaddedPosition,
    tail: PaddedPosition,
    capacity: u64,
    mask: u64,
    buffer: Box<[T]>,
}

// Safety: exactly one producer thread writes `head`/slots it owns, exactly
// one consumer thread writes `tail`/reads slots it owns; the acquire/release
// pair on head/tail establishes happens-before for the payload.
unsafe impl<T: Pod + Send> Sync for SpscQueue<T> {}

impl<T: Pod + Send> SpscQueue<T> {
    /// `capacity` must be a non-zero power of two (slot count).
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(ReservoirError::config(format!(
                "spsc capacity must be a non-zero power of two, got {capacity}"
            )));
        }

        let buffer = vec![T::zeroed(); capacity].into_boxed_slice();
        Ok(Self {
            head: PaddedPosition::new(0),
            tail: PaddedPosition::new(0),
            capacity: capacity as u64,
            mask: capacity as u64 - 1,
            buffer,
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

    /// Push `v`. Returns `false` ("would block") if the ring is full.
    pub fn try_push(&self, v: T) -> bool {
        let head = self.head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);

        if self.is_full(head, tail) {
            return false;
        }

        let idx = (head & self.mask) as usize;
        // Safety: idx < capacity == buffer.len(); no other thread writes
        // this slot until `head` is store-released below.
        unsafe {
            let slot = self.buffer.as_ptr().add(idx) as *mut T;
            slot.write(v);
        }
        self.head.value.store(head + 1, Ordering::Release);
        true
    }

    /// Pop the oldest element. Returns `None` ("would block") if empty.
    pub fn try_pop(&self) -> Option<T> {
        let head = self.head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);

        if self.is_empty(head, tail) {
            return None;
        }

        let idx = (tail & self.mask) as usize;
        let v = self.buffer[idx];
        self.tail.value.store(tail + 1, Ordering::Release);
        Some(v)
    }

    /// Read the oldest element without advancing `tail`.
    pub fn try_peek(&self) -> Option<T> {
        let head = self.head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);

        if self.is_empty(head, tail) {
            return None;
        }

        Some(self.buffer[(tail & self.mask) as usize])
    }

    pub fn is_queue_empty(&self) -> bool {
        let head = self.head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);
        self.is_empty(head, tail)
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
