//! Per-sender pending text for one destination.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Unreleased characters, FIFO per sender.
///
/// An entry exists from a sender's first admitted text until the drain loop
/// retires it. Between a release and the retire check an entry may be
/// momentarily empty; it still counts as present.
pub struct BufferStore<S> {
    buffers: HashMap<S, VecDeque<char>>,
}

impl<S: Eq + Hash + Clone> BufferStore<S> {
    pub fn new() -> Self {
        Self { buffers: HashMap::new() }
    }

    /// Pending character count, or `None` if the sender has no entry.
    pub fn pending(&self, sender: &S) -> Option<usize> {
        self.buffers.get(sender).map(VecDeque::len)
    }

    /// Append text. Returns true if this created the sender's entry.
    pub fn append(&mut self, sender: &S, text: &str) -> bool {
        match self.buffers.get_mut(sender) {
            Some(buffer) => {
                buffer.extend(text.chars());
                false
            }
            None => {
                self.buffers.insert(sender.clone(), text.chars().collect());
                true
            }
        }
    }

    /// Take the next character for a sender.
    pub fn release(&mut self, sender: &S) -> Option<char> {
        self.buffers.get_mut(sender)?.pop_front()
    }

    /// Drop the sender's entry if nothing is left. Returns true if dropped.
    pub fn retire_if_empty(&mut self, sender: &S) -> bool {
        match self.buffers.get(sender) {
            Some(buffer) if buffer.is_empty() => {
                self.buffers.remove(sender);
                true
            }
            _ => false,
        }
    }

    /// Remove every entry, returning the unreleased text per sender.
    pub fn take_all(&mut self) -> Vec<(S, String)> {
        self.buffers
            .drain()
            .filter(|(_, buffer)| !buffer.is_empty())
            .map(|(sender, buffer)| (sender, buffer.into_iter().collect()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

impl<S: Eq + Hash + Clone> Default for BufferStore<S> {
    fn default() -> Self {
        Self::new()
    }
}
