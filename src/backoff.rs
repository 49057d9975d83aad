//! Spin-then-sleep delay object used around CAS retries.
//!
//! A current delay that doubles (or stays flat) each call, spinning below
//! [`BUSY_WAIT_LIMIT`](crate::constants::BUSY_WAIT_LIMIT) units and
//! sleeping above it.

use std::time::Duration;

use crate::constants::BUSY_WAIT_LIMIT;

const DEFAULT_START_DELAY: u32 = 10;
const DEFAULT_MAX_DELAY: u32 = 1000;

/// A stateful backoff delay. Each call to [`Backoff::spin`] either busy-spins
/// or sleeps, then grows the delay by `step` (clamped to `max_delay`).
pub struct Backoff {
    cur_delay: u32,
    max_delay: u32,
    step: u32,
    always_busy: bool,
}

impl Backoff {
    fn with_step(step: u32, always_busy: bool) -> Self {
        Self {
            cur_delay: DEFAULT_START_DELAY.max(1),
            max_delay: DEFAULT_MAX_DELAY,
            step,
            always_busy,
        }
    }

    /// Constant backoff: delay never grows (`step = 1`).
    pub fn constant() -> Self {
        Self::with_step(1, false)
    }

    /// Exponential backoff: delay doubles each call (`step = 2`).
    pub fn exponential() -> Self {
        Self::with_step(2, false)
    }

    /// Exponential backoff that never sleeps, only spins longer and longer.
    pub fn exponential_busy() -> Self {
        Self::with_step(2, true)
    }

    /// Spin or sleep for the current delay, then advance it.
    pub fn spin(&mut self) {
        if self.always_busy || self.cur_delay < BUSY_WAIT_LIMIT {
            for _ in 0..self.cur_delay {
                std::hint::spin_loop();
            }
        } else {
            std::thread::sleep(Duration::from_micros(self.cur_delay as u64));
        }

        self.cur_delay = self.cur_delay.saturating_mul(self.step).min(self.max_delay);
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::exponential()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_and_clamps() {
        let mut b = Backoff::exponential();
        let mut prev = 0;
        for _ in 0..20 {
            assert!(b.cur_delay >= prev || b.cur_delay == b.max_delay);
            prev = b.cur_delay;
            b.spin();
        }
        assert!(b.cur_delay <= DEFAULT_MAX_DELAY);
    }

    #[test]
    fn constant_backoff_never_grows_past_start() {
        let mut b = Backoff::constant();
        b.spin();
        let after_one = b.cur_delay;
        b.spin();
        assert_eq!(after_one, b.cur_delay);
    }
}
