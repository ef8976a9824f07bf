//! Boundary traits for the collaborators the pacer drives.
//!
//! Rates, rewards and output are owned by the caller. The pacer only
//! consumes them through these narrow interfaces. Collaborator failures are
//! reported as plain strings and wrapped into `PaceError` by the core.

use std::fmt::Debug;
use std::hash::Hash;

use async_trait::async_trait;

/// Identity of an output destination (e.g. a channel).
pub trait DestinationId: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T> DestinationId for T where T: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

/// Identity of a sender. `Ord` breaks due-time ties deterministically.
pub trait SenderId: Ord + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T> SenderId for T where T: Ord + Hash + Clone + Debug + Send + Sync + 'static {}

/// Supplies a sender's current emission rate in characters per second.
///
/// Queried once per admitted enqueue and once per released character.
#[async_trait]
pub trait RateProvider<S>: Send + Sync {
    async fn get_rate(&self, sender: &S) -> Result<f64, String>;
}

/// Notified once per character actually delivered.
#[async_trait]
pub trait RewardSink<S>: Send + Sync {
    async fn on_delivered(&self, sender: &S) -> Result<(), String>;
}

/// One output unit (e.g. a message) that can be overwritten in place.
#[async_trait]
pub trait OutputHandle: Send + Sync {
    /// Replace the unit's full content.
    async fn edit(&mut self, content: &str) -> Result<(), String>;
}

/// Creates output units at a destination.
#[async_trait]
pub trait OutputSink<D>: Send + Sync {
    async fn send(&self, destination: &D, content: &str) -> Result<Box<dyn OutputHandle>, String>;
}
