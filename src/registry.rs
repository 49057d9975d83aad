//! Per-participant announced-position tables, shared by MPSC and MPMC.
//!
//! A table of `max_threads` cache-line-aligned records, one per registered
//! producer (and, for MPMC, consumer), each holding the position that
//! participant is currently trying to reserve, or [`INVALID`] when idle.
//! [`advance_bound`] lazily refreshes a cached bound from this table by
//! looping on a lost CAS rather than recursing, avoiding unbounded stack
//! depth under contention.

use std::sync::atomic::{AtomicU64, Ordering};

/// Sentinel meaning "this participant is not currently reserving a position."
pub const INVALID: u64 = u64::MAX;

/// A single cache-line-padded announced position.
#[repr(align(64))]
pub struct Slot(AtomicU64);

impl Slot {
    fn new() -> Self {
        Self(AtomicU64::new(INVALID))
    }

    #[inline]
    pub fn announce(&self, pos: u64) {
        self.0.store(pos, Ordering::Release);
    }

    #[inline]
    pub fn clear(&self) {
        self.0.store(INVALID, Ordering::Release);
    }

    #[inline]
    pub fn load(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}

/// A table of one announced position per registered participant.
pub struct Table {
    slots: Box<[Slot]>,
}

impl Table {
    pub fn new(max_participants: usize) -> Self {
        let slots = (0..max_participants).map(|_| Slot::new()).collect::<Vec<_>>();
        Self { slots: slots.into_boxed_slice() }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn slot(&self, pid: usize) -> &Slot {
        &self.slots[pid]
    }

    /// Minimum announced position across every slot, combined with `floor`
    /// (typically the queue's real head/tail counter).
    pub fn min_announced(&self, floor: u64) -> u64 {
        self.slots.iter().fold(floor, |acc, slot| acc.min(slot.load()))
    }
}

/// RAII guard clearing a participant's announced position back to
/// [`INVALID`] exactly once, on drop, regardless of how many reservation
/// retries ran while the guard was held.
pub struct AnnounceGuard<'a> {
    slot: &'a Slot,
}

impl Drop for AnnounceGuard<'_> {
    fn drop(&mut self) {
        self.slot.clear();
    }
}

impl Table {
    /// Borrow participant `pid`'s slot with a guard that clears it on drop.
    pub fn guard(&self, pid: usize) -> AnnounceGuard<'_> {
        AnnounceGuard { slot: &self.slots[pid] }
    }
}

/// Lazily advance `cached` to `candidate` (computed by scanning a [`Table`]
/// and the real counter), CAS-installing only if the new value is strictly
/// greater than what the caller last observed. Iterates rather than
/// recursing when the CAS loses to a concurrently-installed larger value.
pub fn advance_bound(cached: &AtomicU64, mut old: u64, candidate: u64) -> u64 {
    let mut candidate = candidate;
    loop {
        if candidate <= old {
            return old;
        }
        match cached.compare_exchange(old, candidate, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return candidate,
            Err(actual) => {
                if actual >= candidate {
                    // Someone else already advanced it at least this far.
                    return actual;
                }
                old = actual;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_starts_all_invalid() {
        let table = Table::new(4);
        for i in 0..4 {
            assert_eq!(table.slot(i).load(), INVALID);
        }
        assert_eq!(table.min_announced(42), 42);
    }

    #[test]
    fn announce_and_clear_round_trip() {
        let table = Table::new(2);
        table.slot(0).announce(10);
        table.slot(1).announce(5);
        assert_eq!(table.min_announced(u64::MAX), 5);
        table.slot(1).clear();
        assert_eq!(table.min_announced(u64::MAX), 10);
    }

    #[test]
    fn advance_bound_only_moves_forward() {
        let cached = AtomicU64::new(0);
        let new = advance_bound(&cached, 0, 5);
        assert_eq!(new, 5);
        assert_eq!(cached.load(Ordering::SeqCst), 5);

        // A stale `old` with a smaller candidate should not regress it.
        let unchanged = advance_bound(&cached, 0, 3);
        assert_eq!(unchanged, 5);
        assert_eq!(cached.load(Ordering::SeqCst), 5);
    }
}

/// Exhaustive interleaving check for the compare-exchange-if-greater pattern
/// `advance_bound` is built from, run separately from the normal test suite
/// with `RUSTFLAGS="--cfg loom" cargo test --release`. Modeled directly
/// against `loom`'s own atomics rather than this module's `Table`/`Slot`,
/// which are built on plain `std::sync::atomic` and so aren't visible to
/// loom's scheduler.
#[cfg(loom)]
mod loom_tests {
    use loom::sync::atomic::AtomicU64;
    use loom::sync::Arc;
    use loom::thread;
    use std::sync::atomic::Ordering;

    #[test]
    fn concurrent_advance_bound_never_regresses() {
        loom::model(|| {
            let cached = Arc::new(AtomicU64::new(0));

            let handles: Vec<_> = [3u64, 7u64]
                .into_iter()
                .map(|candidate| {
                    let cached = cached.clone();
                    thread::spawn(move || {
                        let old = cached.load(Ordering::Acquire);
                        if candidate > old {
                            let _ = cached.compare_exchange(
                                old,
                                candidate,
                                Ordering::SeqCst,
                                Ordering::SeqCst,
                            );
                        }
                    })
                })
                .collect();

            for h in handles {
                h.join().unwrap();
            }

            assert!(cached.load(Ordering::SeqCst) <= 7);
        });
    }
}
