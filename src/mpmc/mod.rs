//! MPMC: multi-producer, multi-consumer reservation with symmetric
//! `last_head`/`last_tail` tracking.
//!
//! Unlike MPSC, both `last_head` and `last_tail` are real cached members
//! here, each refreshed from its own announced-position table (producers
//! announce into a head table, consumers into a tail table).

mod any;
mod typed;

pub use any::MpmcAny;
pub use typed::MpmcQueue;
