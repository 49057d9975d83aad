//! reservoir — bounded, lock-free message queues.
//!
//! A family of single-allocation ring buffers for exchanging records
//! between producer and consumer threads without locks: `spsc`, `mpsc`,
//! `mpmc`, and `mpsc_pc` (per-CPU sharded MPSC), each in a typed flavor
//! (fixed-size, [`bytemuck::Pod`] values) and an "Any" flavor
//! (variable-length byte records, length-prefixed).
//!
//! All four share the same non-blocking contract: `try_push`/`try_pop`
//! never suspend, returning `false`/`None` ("would block") instead.
//! Suspension is a separate, composable concern — see [`wait_event`] and
//! [`adaptive`].

pub mod adaptive;
pub mod backoff;
pub mod constants;
pub mod cpu;
pub mod crc32;
pub mod dispatch;
pub mod error;
pub mod insights;
pub mod layout;
pub mod metrics;
pub mod mpmc;
pub mod mpsc;
pub mod mpsc_pc;
pub mod registry;
pub mod rseq;
pub mod splice;
pub mod spsc;
pub mod wait_event;

pub use error::{ReservoirError, Result};
pub use mpmc::{MpmcAny, MpmcQueue};
pub use mpsc::{MpscAny, MpscQueue};
pub use mpsc_pc::MpscPcQueue;
pub use spsc::{SpscAny, SpscQueue};
pub use wait_event::WaitEvent;
