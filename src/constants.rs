//! Reservoir tuning constants.
//!
//! Core constants shared by the ring-buffer implementations.

/// Default ring buffer capacity (slots for typed queues, bytes for Any queues).
pub const DEFAULT_RING_BUFFER_SIZE: usize = 1024 * 1024;

/// Default number of registered participants (producers/consumers) an
/// MPSC/MPMC announcement table is sized for when not overridden.
pub const DEFAULT_MAX_THREADS: usize = 64;

/// Width, in bytes, of the length-prefix word preceding each Any-variant
/// record.
pub const WORD_SIZE: usize = std::mem::size_of::<u64>();

/// Smallest Any-queue byte capacity that can hold even a single
/// zero-length record: one length prefix and at least one payload byte.
pub const MIN_ANY_CAPACITY: usize = WORD_SIZE + 1;

/// Below this many units of backoff delay, `Backoff` spins instead of
/// sleeping.
pub const BUSY_WAIT_LIMIT: u32 = 32;

/// Bounded spin iterations `AdaptiveWait` performs before parking on a
/// `WaitEvent`.
pub const ADAPTIVE_SPIN_LIMIT: u32 = 1000;
