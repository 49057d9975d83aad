//! `WaitEvent`: a counted condition variable.
//!
//! Couples the lock-free queues to blocking waiters. Built on
//! `parking_lot::Mutex`/`Condvar`, plus a waiter-count fast path:
//! `wakeup_one`/`wakeup_all` skip the mutex and condvar entirely when
//! nobody is parked.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{ReservoirError, Result};

/// A counted condition variable usable by any number of waiters and wakers.
///
/// `WaitEvent` holds no reference to the predicate it waits on; callers
/// supply one as a closure each time they wait.
pub struct WaitEvent {
    mutex: Mutex<()>,
    condvar: Condvar,
    waiters: AtomicUsize,
}

impl WaitEvent {
    pub fn new() -> Self {
        Self {
            mutex: Mutex::new(()),
            condvar: Condvar::new(),
            waiters: AtomicUsize::new(0),
        }
    }

    /// Block until `pred()` returns true. Returns immediately without
    /// touching the mutex if the predicate is already satisfied.
    pub fn wait<F: FnMut() -> bool>(&self, mut pred: F) {
        if pred() {
            return;
        }

        self.waiters.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.mutex.lock();
        while !pred() {
            self.condvar.wait(&mut guard);
        }
        self.waiters.fetch_sub(1, Ordering::SeqCst);
    }

    /// Like [`WaitEvent::wait`], but gives up once `deadline` passes,
    /// returning [`ReservoirError::Timeout`] instead of blocking forever.
    /// Measured against a steady monotonic clock, immune to wall-clock jumps.
    pub fn wait_until<F: FnMut() -> bool>(&self, deadline: Instant, mut pred: F) -> Result<()> {
        if pred() {
            return Ok(());
        }

        self.waiters.fetch_add(1, Ordering::SeqCst);
        let result = (|| {
            let mut guard = self.mutex.lock();
            while !pred() {
                let now = Instant::now();
                if now >= deadline {
                    return Err(ReservoirError::Timeout);
                }
                let remaining = deadline - now;
                let timed_out = self.condvar.wait_for(&mut guard, remaining).timed_out();
                if timed_out && !pred() {
                    return Err(ReservoirError::Timeout);
                }
            }
            Ok(())
        })();
        self.waiters.fetch_sub(1, Ordering::SeqCst);
        result
    }

    /// Wake at most one waiter. A no-op — no mutex acquired — if nobody is
    /// parked.
    pub fn wakeup_one(&self) {
        if self.waiters.load(Ordering::SeqCst) == 0 {
            return;
        }
        let _guard = self.mutex.lock();
        self.condvar.notify_one();
    }

    /// Wake every waiter. A no-op — no mutex acquired — if nobody is parked.
    pub fn wakeup_all(&self) {
        if self.waiters.load(Ordering::SeqCst) == 0 {
            return;
        }
        let _guard = self.mutex.lock();
        self.condvar.notify_all();
    }

    /// Current number of parked waiters. A hint for diagnostics/tests.
    pub fn waiter_count(&self) -> usize {
        self.waiters.load(Ordering::SeqCst)
    }
}

impl Default for WaitEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience: wait with a relative timeout from now.
pub fn wait_for<F: FnMut() -> bool>(event: &WaitEvent, timeout: Duration, pred: F) -> Result<()> {
    event.wait_until(Instant::now() + timeout, pred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn wakeup_with_zero_waiters_never_touches_mutex() {
        let event = WaitEvent::new();
        // Should return immediately without blocking; nothing to assert on
        // the mutex itself other than that this doesn't deadlock.
        event.wakeup_one();
        event.wakeup_all();
        assert_eq!(event.waiter_count(), 0);
    }

    #[test]
    fn wait_returns_immediately_when_predicate_already_true() {
        let event = WaitEvent::new();
        event.wait(|| true);
    }

    #[test]
    fn wait_wakes_on_signal() {
        let event = Arc::new(WaitEvent::new());
        let ready = Arc::new(AtomicBool::new(false));

        let e2 = event.clone();
        let r2 = ready.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            r2.store(true, Ordering::SeqCst);
            e2.wakeup_all();
        });

        event.wait(|| ready.load(Ordering::SeqCst));
        handle.join().unwrap();
    }

    #[test]
    fn wait_until_times_out() {
        let event = WaitEvent::new();
        let result = event.wait_until(Instant::now() + Duration::from_millis(5), || false);
        assert!(matches!(result, Err(ReservoirError::Timeout)));
    }
}
