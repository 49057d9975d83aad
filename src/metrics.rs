//! Lightweight, always-on counters for observability. Relaxed atomics
//! only; never on the hot reservation path of any queue's `Try*` method
//! beyond a single `fetch_add`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-queue counters a caller may wire up around its own `Try*` calls.
pub struct Metrics {
    pub pushed: AtomicU64,
    pub popped: AtomicU64,
    pub push_would_block: AtomicU64,
    pub pop_would_block: AtomicU64,
    pub cas_retries: AtomicU64,
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            pushed: AtomicU64::new(0),
            popped: AtomicU64::new(0),
            push_would_block: AtomicU64::new(0),
            pop_would_block: AtomicU64::new(0),
            cas_retries: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_push(&self) {
        self.pushed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_pop(&self) {
        self.popped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_push_would_block(&self) {
        self.push_would_block.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_pop_would_block(&self) {
        self.pop_would_block.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_cas_retry(&self) {
        self.cas_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pushed: self.pushed.load(Ordering::Relaxed),
            popped: self.popped.load(Ordering::Relaxed),
            push_would_block: self.push_would_block.load(Ordering::Relaxed),
            pop_would_block: self.pop_would_block.load(Ordering::Relaxed),
            cas_retries: self.cas_retries.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub pushed: u64,
    pub popped: u64,
    pub push_would_block: u64,
    pub pop_would_block: u64,
    pub cas_retries: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let m = Metrics::new();
        m.record_push();
        m.record_push();
        m.record_pop();
        m.record_push_would_block();

        let snap = m.snapshot();
        assert_eq!(snap.pushed, 2);
        assert_eq!(snap.popped, 1);
        assert_eq!(snap.push_would_block, 1);
        assert_eq!(snap.cas_retries, 0);
    }
}
