//! Drain loop: release one character per due event until the queue empties.
//!
//! One loop runs per draining destination. It suspends only while waiting
//! for the next due time. With `flush_on_drain` it also waits for the final
//! flush, but any newly scheduled character cuts that wait short.

use tokio::time::Instant;

use super::admission;
use super::coalescer::OutputCoalescer;
use super::destination::Destination;
use crate::error::PaceError;
use crate::interfaces::{RateProvider, RewardSink, SenderId};
use crate::telemetry;

/// Totals for one completed drain loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Characters released.
    pub released: u64,
    /// Flushes pushed to the output sink.
    pub flushes: u64,
    /// Output units created.
    pub units: u64,
}

/// Run the loop until the destination goes idle or a fatal error occurs.
///
/// The rate is re-read after every character so rate changes apply to text
/// already in flight. The reward sink hears about each delivered character.
pub async fn drain<D, S>(
    destination: &Destination<S>,
    coalescer: &mut OutputCoalescer<D>,
    rates: &dyn RateProvider<S>,
    rewards: &dyn RewardSink<S>,
    flush_on_drain: bool,
) -> Result<DrainReport, PaceError>
where
    D: Send + Sync,
    S: SenderId,
{
    let mut released = 0u64;

    loop {
        let tail_unflushed = flush_on_drain && coalescer.is_dirty() && !destination.has_events();
        if tail_unflushed {
            if let Some(at) = coalescer.next_flush_at() {
                tokio::select! {
                    _ = tokio::time::sleep_until(at) => {}
                    // New text goes first; the tail is flushed once it drains
                    _ = destination.event_scheduled() => continue,
                }
            }
            coalescer.flush(Instant::now()).await?;
            continue;
        }

        let Some(event) = destination.pop_event() else {
            break;
        };
        tokio::time::sleep_until(event.due).await;

        let Some(c) = destination.release(&event.sender) else {
            tracing::warn!(sender = ?event.sender, "scheduled sender had no pending text");
            destination.retire(&event.sender);
            continue;
        };
        coalescer.push(c);
        released += 1;
        telemetry::record_release();

        coalescer.maybe_flush(Instant::now()).await?;

        let rate = rates
            .get_rate(&event.sender)
            .await
            .map_err(PaceError::RateProvider)?;
        rewards
            .on_delivered(&event.sender)
            .await
            .map_err(PaceError::Reward)?;

        // A bad rate here came from the provider, not from the caller
        destination.settle(&event.sender, || {
            admission::next_due(event.due, rate)
                .map_err(|_| PaceError::RateProvider(format!("invalid rate {rate}")))
        })?;
    }

    Ok(DrainReport {
        released,
        flushes: coalescer.flushes(),
        units: coalescer.units(),
    })
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
