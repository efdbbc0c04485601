//! Same-tick work queue: actors waiting to consume the rest of a tick.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use shellkit_surface::AnimationId;

/// Min-heap on remaining elapsed time; equal times pop in push order.
#[derive(Debug, Default)]
pub struct TickQueue {
    heap: BinaryHeap<Reverse<(i64, u64, AnimationId)>>,
    seq: u64,
}

impl TickQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: AnimationId, remaining: i64) {
        self.heap.push(Reverse((remaining, self.seq, id)));
        self.seq = self.seq.wrapping_add(1);
    }

    /// Next `(id, remaining)` with the smallest remaining time.
    pub fn pop(&mut self) -> Option<(AnimationId, i64)> {
        self.heap.pop().map(|Reverse((remaining, _, id))| (id, remaining))
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.seq = 0;
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smallest_remaining_first_then_fifo() {
        let mut q = TickQueue::new();
        q.push(9, 30);
        q.push(5, 10);
        q.push(1, 30);
        q.push(7, 10);
        let order: Vec<_> = std::iter::from_fn(|| q.pop()).collect();
        assert_eq!(order, vec![(5, 10), (7, 10), (9, 30), (1, 30)]);
        assert!(q.is_empty());
    }
}
