//! MPSC-PC: multi-producer over per-CPU shards, single consumer.
//!
//! The queue is one [`SpscAny`](crate::spsc::SpscAny) shard per CPU; a
//! producer always pushes into the shard of the CPU it is currently
//! running on, and the consumer polls shards round-robin.

mod queue;

pub use queue::MpscPcQueue;
