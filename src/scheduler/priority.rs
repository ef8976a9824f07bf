//! Due-time ordering of senders.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tokio::time::Instant;

/// The instant a sender's next character is due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent<S> {
    pub due: Instant,
    pub sender: S,
}

/// Heap entry. `BinaryHeap` is a max-heap, so ordering is reversed here.
#[derive(Debug)]
struct DueItem<S> {
    event: ScheduledEvent<S>,
}

impl<S: Ord> PartialEq for DueItem<S> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<S: Ord> Eq for DueItem<S> {}

impl<S: Ord> PartialOrd for DueItem<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: Ord> Ord for DueItem<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        match other.event.due.cmp(&self.event.due) {
            Ordering::Equal => other.event.sender.cmp(&self.event.sender), // Lower sender = earlier
            ord => ord,
        }
    }
}

/// Min-heap of scheduled events keyed by (due, sender).
pub struct DueQueue<S> {
    heap: BinaryHeap<DueItem<S>>,
}

impl<S: Ord> DueQueue<S> {
    pub fn new() -> Self {
        Self { heap: BinaryHeap::new() }
    }

    pub fn push(&mut self, due: Instant, sender: S) {
        self.heap.push(DueItem { event: ScheduledEvent { due, sender } });
    }

    pub fn pop(&mut self) -> Option<ScheduledEvent<S>> {
        self.heap.pop().map(|item| item.event)
    }

    pub fn peek(&self) -> Option<&ScheduledEvent<S>> {
        self.heap.peek().map(|item| &item.event)
    }

    /// Linear scan; used for invariant checks, not on the hot path.
    pub fn contains(&self, sender: &S) -> bool {
        self.heap.iter().any(|item| &item.event.sender == sender)
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<S: Ord> Default for DueQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}
