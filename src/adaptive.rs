//! Adaptive wait glue: bounded spin-with-backoff, then suspend.
//!
//! Clients combine `try_push`/`try_pop` with a predicate and a
//! [`WaitEvent`]. This module is the generic "spin up to N times, then
//! park" pattern; the queues themselves never call it — it's client-side
//! glue layered on top of a queue's non-blocking `try_push`/`try_pop`.

use crate::backoff::Backoff;
use crate::constants::ADAPTIVE_SPIN_LIMIT;
use crate::wait_event::WaitEvent;

/// Spin on `pred` with exponential backoff for up to
/// [`ADAPTIVE_SPIN_LIMIT`] iterations; if it's still false, park on `event`
/// until it becomes true.
pub fn adaptive_wait<F: FnMut() -> bool>(event: &WaitEvent, mut pred: F) {
    let mut backoff = Backoff::exponential();
    for _ in 0..ADAPTIVE_SPIN_LIMIT {
        if pred() {
            return;
        }
        backoff.spin();
    }

    event.wait(pred);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn returns_immediately_once_predicate_holds_within_spin_budget() {
        let event = WaitEvent::new();
        let mut calls = 0;
        adaptive_wait(&event, || {
            calls += 1;
            calls >= 3
        });
        assert!(calls >= 3);
    }

    #[test]
    fn falls_through_to_park_when_predicate_needs_a_wakeup() {
        let event = Arc::new(WaitEvent::new());
        let flag = Arc::new(AtomicBool::new(false));

        let e2 = event.clone();
        let f2 = flag.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(2));
            f2.store(true, Ordering::SeqCst);
            e2.wakeup_all();
        });

        adaptive_wait(&event, || flag.load(Ordering::SeqCst));
        handle.join().unwrap();
    }
}
