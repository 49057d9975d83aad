//! Dynamic dispatch across queue flavors.
//!
//! A tagged union of the concrete typed queues behind one capability set.
//! The match happens once per call, at the outer boundary — never inside a
//! single flavor's hot reservation loop.

use bytemuck::Pod;

use crate::mpmc::MpmcQueue;
use crate::mpsc::MpscQueue;
use crate::spsc::SpscQueue;

/// Any one of the typed queue flavors, chosen at construction time and
/// driven through one shared interface thereafter.
pub enum TypedQueue<T: Pod + Send> {
    Spsc(SpscQueue<T>),
    Mpsc(MpscQueue<T>),
    Mpmc(MpmcQueue<T>),
}

impl<T: Pod + Send> TypedQueue<T> {
    /// Push `v`. `pid` is ignored by the `Spsc` variant (it has exactly one
    /// producer) and otherwise indexes the caller's announcement slot.
    pub fn try_push(&self, pid: usize, v: T) -> bool {
        match self {
            TypedQueue::Spsc(q) => q.try_push(v),
            TypedQueue::Mpsc(q) => q.try_push(pid, v),
            TypedQueue::Mpmc(q) => q.try_push(pid, v),
        }
    }

    /// Pop the oldest element. `pid` is ignored by `Spsc`/`Mpsc` (single
    /// consumer) and otherwise indexes the caller's announcement slot.
    pub fn try_pop(&self, pid: usize) -> Option<T> {
        match self {
            TypedQueue::Spsc(q) => q.try_pop(),
            TypedQueue::Mpsc(q) => q.try_pop(),
            TypedQueue::Mpmc(q) => q.try_pop(pid),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            TypedQueue::Spsc(q) => q.is_queue_empty(),
            TypedQueue::Mpsc(q) => q.is_queue_empty(),
            TypedQueue::Mpmc(q) => q.is_queue_empty(),
        }
    }

    pub fn is_full(&self) -> bool {
        match self {
            TypedQueue::Spsc(q) => q.is_queue_full(),
            TypedQueue::Mpsc(q) => q.is_queue_full(),
            TypedQueue::Mpmc(q) => q.is_queue_full(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_to_the_chosen_flavor() {
        let flavors: Vec<TypedQueue<u32>> = vec![
            TypedQueue::Spsc(SpscQueue::new(4).unwrap()),
            TypedQueue::Mpsc(MpscQueue::new(4, 2).unwrap()),
            TypedQueue::Mpmc(MpmcQueue::new(4, 2).unwrap()),
        ];

        for q in &flavors {
            assert!(q.is_empty());
            assert!(q.try_push(0, 7));
            assert_eq!(q.try_pop(0), Some(7));
        }
    }
}
