use std::cell::UnsafeCell;

use crate::constants::WORD_SIZE;
use crate::cpu;
use crate::error::{ReservoirError, Result};
use crate::rseq;
use crate::splice::copy_elem_into;
use crate::spsc::SpscAny;

struct ConsumerCursor {
    next_poll_cpu: usize,
    current_fetch: Option<(usize, usize)>, // (shard_index, remembered size)
}

/// A push-scalable MPSC queue built from one [`SpscAny`] shard per CPU.
///
/// Producers need no `pid`: the shard is derived from the CPU the calling
/// thread is currently running on. Exactly one thread may call the `Try*`
/// consumer methods at a time — the same single-consumer contract every
/// other flavor's consumer side carries.
pub struct MpscPcQueue {
    shards: Box<[SpscAny]>,
    // Accessed only by the single consumer thread; see the struct-level
    // contract above. No atomics needed since only one thread ever touches it.
    consumer: UnsafeCell<ConsumerCursor>,
}

unsafe impl Sync for MpscPcQueue {}

impl MpscPcQueue {
    /// Whether this kernel supports the `rseq` facility MPSC-PC relies on.
    /// Construction still succeeds if this returns `false`, but push
    /// behavior is then undefined; callers must gate on this.
    pub fn available() -> bool {
        rseq::available()
    }

    /// One shard per CPU, each able to hold `per_cpu_capacity_bytes` bytes.
    pub fn new(per_cpu_capacity_bytes: usize) -> Result<Self> {
        let num_shards = num_cpus::get();
        if num_shards == 0 {
            return Err(ReservoirError::config("could not determine CPU count"));
        }

        let mut shards = Vec::with_capacity(num_shards);
        for _ in 0..num_shards {
            shards.push(SpscAny::new(per_cpu_capacity_bytes)?);
        }

        Ok(Self {
            shards: shards.into_boxed_slice(),
            consumer: UnsafeCell::new(ConsumerCursor { next_poll_cpu: 0, current_fetch: None }),
        })
    }

    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    /// Push `elem` into the shard of the CPU the calling thread is
    /// currently on.
    ///
    /// Runs a restartable section: pick a shard from the CPU observed at
    /// the start, splice the payload into it speculatively, then re-read
    /// the current CPU. If it still matches,
    /// commit by publishing the new head (the section's single commit
    /// store); if not, the thread migrated mid-section and the section
    /// restarts from scratch on whatever shard it's now on. See
    /// [`crate::rseq`] for how this differs from a true kernel-enforced
    /// rseq commit.
    pub fn try_push(&self, elem: &[u8]) -> bool {
        let need = (elem.len() + WORD_SIZE) as u64;

        loop {
            let cpu_start = cpu::current_cpu() % self.shards.len();
            let shard = &self.shards[cpu_start];
            let (head, tail) = shard.load_positions();

            if shard.is_full(need, head, tail) {
                return false;
            }

            // Safety: `head..head+need` (mod capacity) is free per the
            // fullness check above; no other producer writes this shard
            // while this thread is the one scheduled on `cpu_start`.
            unsafe {
                copy_elem_into(
                    shard.buffer_ptr(),
                    shard.capacity_bytes(),
                    head,
                    elem.as_ptr(),
                    elem.len(),
                );
            }

            if cpu::current_cpu() % self.shards.len() != cpu_start {
                // Migrated (or the core count view changed) before commit:
                // the speculative write above is simply never published.
                continue;
            }

            shard.commit_head(head + need);
            return true;
        }
    }

    /// Size of the next record the consumer would receive, advancing the
    /// round-robin shard cursor as needed. Remembers which shard/size it
    /// found so the paired [`MpscPcQueue::try_pop`] doesn't have to
    /// re-search.
    pub fn next_element_size(&self) -> Option<usize> {
        // Safety: single-consumer contract.
        let cursor = unsafe { &mut *self.consumer.get() };

        if let Some((_, size)) = cursor.current_fetch {
            return Some(size);
        }

        for _ in 0..self.shards.len() {
            if cursor.next_poll_cpu == self.shards.len() {
                cursor.next_poll_cpu = 0;
            }
            let idx = cursor.next_poll_cpu;
            cursor.next_poll_cpu += 1;

            if let Some(size) = self.shards[idx].next_element_size() {
                cursor.current_fetch = Some((idx, size));
                return Some(size);
            }
        }

        None
    }

    /// Pop the record located by the most recent [`MpscPcQueue::next_element_size`]
    /// call (searching for one first if none is pending).
    pub fn try_pop(&self, dst: &mut [u8]) -> Option<usize> {
        self.next_element_size()?;

        // Safety: single-consumer contract.
        let cursor = unsafe { &mut *self.consumer.get() };
        let (idx, _) = cursor.current_fetch.take()?;
        self.shards[idx].try_pop(dst)
    }

    /// Approximate: true iff every shard was observed empty at inspection
    /// time.
    pub fn is_queue_empty(&self) -> bool {
        self.shards.iter().all(|s| s.is_queue_empty())
    }

    /// Approximate: true iff the *current* CPU's shard is full at the
    /// instant of inspection — only a hint, since the calling thread may
    /// migrate immediately after this returns.
    pub fn is_queue_full(&self) -> bool {
        let idx = cpu::current_cpu() % self.shards.len();
        self.shards[idx].is_queue_full()
    }
}
