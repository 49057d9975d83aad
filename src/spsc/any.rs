//! SPSC-Any: single-producer single-consumer ring of variable-length,
//! length-prefixed byte records.

use std::sync::atomic::Ordering;

use crate::constants::{MIN_ANY_CAPACITY, WORD_SIZE};
use crate::error::{ReservoirError, Result};
use crate::layout::{AlignedRegion, PaddedPosition};
use crate::splice::{copy_elem_into, copy_out_of, read_len_prefix};

/// A bounded single-producer/single-consumer byte ring. Each record is
/// stored as a length-prefix word followed by its payload bytes, spliced
/// across the ring boundary as needed.
pub struct SpscAny {
    head: PaddedPosition,
    tail: PaddedPosition,
    capacity: u64,
    buffer: AlignedRegion,
}

unsafe impl Sync for SpscAny {}

impl SpscAny {
    /// `capacity_bytes` must hold at least one length prefix plus one
    /// payload byte.
    pub fn new(capacity_bytes: usize) -> Result<Self> {
        if capacity_bytes < MIN_ANY_CAPACITY {
            return Err(ReservoirError::config(format!(
                "spsc-any capacity must be at least {MIN_ANY_CAPACITY} bytes, got {capacity_bytes}"
            )));
        }

        Ok(Self {
            head: PaddedPosition::new(0),
            tail: PaddedPosition::new(0),
            capacity: capacity_bytes as u64,
            buffer: AlignedRegion::new(capacity_bytes),
        })
    }

    #[inline]
    pub(crate) fn is_full(&self, need: u64, head: u64, tail: u64) -> bool {
        head + need - 1 >= tail + self.capacity
    }

    #[inline]
    fn is_empty(&self, head: u64, tail: u64) -> bool {
        tail >= head
    }

    /// Raw `(head, tail)` snapshot and buffer access, for MPSC-PC's
    /// restartable push section, which needs to splice payload bytes into
    /// this shard *before* deciding whether to commit the new head.
    pub(crate) fn load_positions(&self) -> (u64, u64) {
        (self.head.value.load(Ordering::Acquire), self.tail.value.load(Ordering::Acquire))
    }

    pub(crate) fn capacity_bytes(&self) -> usize {
        self.capacity as usize
    }

    pub(crate) fn buffer_ptr(&self) -> *mut u8 {
        self.buffer.as_ptr() as *mut u8
    }

    /// Publish `new_head` — the single commit store of MPSC-PC's
    /// restartable section.
    pub(crate) fn commit_head(&self, new_head: u64) {
        self.head.value.store(new_head, Ordering::Release);
    }

    /// Push `elem`. Returns `false` ("would block") if there isn't room for
    /// the length prefix plus payload.
    pub fn try_push(&self, elem: &[u8]) -> bool {
        let need = (elem.len() + WORD_SIZE) as u64;
        let head = self.head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);

        if self.is_full(need, head, tail) {
            return false;
        }

        // Safety: `need` bytes are free between head and tail+capacity.
        unsafe {
            copy_elem_into(
                self.buffer.as_ptr() as *mut u8,
                self.capacity as usize,
                head,
                elem.as_ptr(),
                elem.len(),
            );
        }
        self.head.value.store(head + need, Ordering::Release);
        true
    }

    /// Size of the next unread record, without consuming it.
    pub fn next_element_size(&self) -> Option<usize> {
        let head = self.head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);
        if self.is_empty(head, tail) {
            return None;
        }
        let len = unsafe { read_len_prefix(self.buffer.as_ptr(), self.capacity as usize, tail) };
        Some(len as usize)
    }

    /// Pop the next record into `dst`, writing `min(dst.len(), record_len)`
    /// bytes. Returns the number of bytes written, or `None` if empty.
    pub fn try_pop(&self, dst: &mut [u8]) -> Option<usize> {
        let head = self.head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);

        if self.is_empty(head, tail) {
            return None;
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

    /// Like [`SpscAny::try_pop`] but does not advance `tail`.
    pub fn try_peek(&self, dst: &mut [u8]) -> Option<usize> {
        let head = self.head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);

        if self.is_empty(head, tail) {
            return None;
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
        Some(n)
    }

    pub fn is_queue_empty(&self) -> bool {
        let head = self.head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);
        self.is_empty(head, tail)
    }

    /// Hint only: whether a zero-length record could currently be pushed.
    pub fn is_queue_full(&self) -> bool {
        let head = self.head.value.load(Ordering::Acquire);
        let tail = self.tail.value.load(Ordering::Acquire);
        self.is_full(WORD_SIZE as u64, head, tail)
    }
}
