//! MPSC / MPSC-Any: multi-producer, single-consumer reservation over a
//! shared ring, using the announced-position protocol rather than
//! per-slot sequence counters.
//!
//! Unlike MPMC, only a consumer-side `last_head` is cached here — there is
//! no producer-side `last_tail` cache, since a single consumer makes
//! rereading the real `tail` atomic on every retry cheap.

mod any;
mod typed;

pub use any::MpscAny;
pub use typed::MpscQueue;
