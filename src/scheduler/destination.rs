//! Per-destination pacing state.
//!
//! The due queue, the sender buffers and the Idle/Draining phase share one
//! lock, so admitting text and the loop's decision to go idle can never
//! interleave. The lock is never held across an await.

use std::hash::Hash;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::admission;
use super::buffers::BufferStore;
use super::priority::{DueQueue, ScheduledEvent};
use crate::error::PaceError;

/// Drain loop state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No loop is running.
    Idle,
    /// One loop is consuming the due queue.
    Draining,
}

/// Outcome of a successful admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admitted {
    /// First character due, if this admission scheduled the sender.
    pub scheduled: Option<Instant>,
}

struct PacingState<S> {
    queue: DueQueue<S>,
    buffers: BufferStore<S>,
    phase: Phase,
}

/// Queue, buffers and loop phase of one destination.
pub struct Destination<S> {
    state: Mutex<PacingState<S>>,
    scheduled: Notify,
}

impl<S: Ord + Hash + Clone> Destination<S> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PacingState {
                queue: DueQueue::new(),
                buffers: BufferStore::new(),
                phase: Phase::Idle,
            }),
            scheduled: Notify::new(),
        }
    }

    /// Admit `text` for `sender` at `rate`, or reject without side effects.
    ///
    /// A sender with no buffer entry gets its first character scheduled at
    /// `now + 1/rate`. A sender already queued just has its buffer extended.
    pub fn try_enqueue(
        &self,
        now: Instant,
        sender: &S,
        rate: f64,
        text: &str,
        max_wait: Duration,
    ) -> Result<Admitted, PaceError> {
        let incoming = text.chars().count();
        let mut state = self.state.lock();
        let pending = state.buffers.pending(sender).unwrap_or(0);
        admission::check(pending, incoming, rate, max_wait)?;

        if incoming == 0 {
            return Ok(Admitted { scheduled: None });
        }
        let first_due = match state.buffers.pending(sender) {
            Some(_) => None,
            None => Some(admission::next_due(now, rate)?),
        };
        state.buffers.append(sender, text);
        if let Some(due) = first_due {
            state.queue.push(due, sender.clone());
            drop(state);
            self.scheduled.notify_one();
        }
        Ok(Admitted { scheduled: first_due })
    }

    /// Resolves once an admission has pushed a new event.
    ///
    /// A notification sent while nobody waits is kept for the next caller,
    /// so an admission racing a waiter is never lost.
    pub async fn event_scheduled(&self) {
        self.scheduled.notified().await;
    }

    /// Idle -> Draining. Returns true only for the caller that made the
    /// transition; everyone else must not start a loop.
    pub fn try_start(&self) -> bool {
        let mut state = self.state.lock();
        if state.phase == Phase::Draining || state.queue.is_empty() {
            return false;
        }
        state.phase = Phase::Draining;
        true
    }

    /// Pop the earliest event. On an empty queue the destination goes Idle
    /// in the same critical section and `None` is returned.
    pub fn pop_event(&self) -> Option<ScheduledEvent<S>> {
        let mut state = self.state.lock();
        let event = state.queue.pop();
        if event.is_none() {
            state.phase = Phase::Idle;
        }
        event
    }

    /// Take the next character for `sender`.
    pub fn release(&self, sender: &S) -> Option<char> {
        self.state.lock().buffers.release(sender)
    }

    /// Reschedule `sender` if text remains, otherwise retire its buffer.
    ///
    /// `next_due` is only evaluated when a reschedule is needed.
    pub fn settle<F>(&self, sender: &S, next_due: F) -> Result<bool, PaceError>
    where
        F: FnOnce() -> Result<Instant, PaceError>,
    {
        let mut state = self.state.lock();
        if state.buffers.retire_if_empty(sender) {
            return Ok(false);
        }
        if state.buffers.pending(sender).is_none() {
            return Ok(false);
        }
        let due = next_due()?;
        state.queue.push(due, sender.clone());
        Ok(true)
    }

    /// Drop `sender`'s buffer entry if it is empty.
    pub fn retire(&self, sender: &S) -> bool {
        self.state.lock().buffers.retire_if_empty(sender)
    }

    /// Drop all pending work and go Idle, returning unreleased text.
    pub fn strand(&self) -> Vec<(S, String)> {
        let mut state = self.state.lock();
        state.queue.clear();
        state.phase = Phase::Idle;
        state.buffers.take_all()
    }

    pub fn has_events(&self) -> bool {
        !self.state.lock().queue.is_empty()
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    pub fn is_draining(&self) -> bool {
        self.phase() == Phase::Draining
    }

    /// Idle with nothing queued or buffered; safe to discard.
    pub fn is_retired(&self) -> bool {
        let state = self.state.lock();
        state.phase == Phase::Idle && state.queue.is_empty() && state.buffers.is_empty()
    }

    /// Unreleased characters for `sender` (0 if absent).
    pub fn pending_chars(&self, sender: &S) -> usize {
        self.state.lock().buffers.pending(sender).unwrap_or(0)
    }

    /// True if `sender` has a scheduled event.
    pub fn is_scheduled(&self, sender: &S) -> bool {
        self.state.lock().queue.contains(sender)
    }

    /// Number of scheduled events.
    pub fn scheduled_len(&self) -> usize {
        self.state.lock().queue.len()
    }
}

impl<S: Ord + Hash + Clone> Default for Destination<S> {
    fn default() -> Self {
        Self::new()
    }
}
