//! Process-wide destination registry and the enqueue entry point.
//!
//! A destination is created on its first accepted enqueue and discarded
//! once its drain loop leaves it idle and empty. Creation, admission and
//! discard for one destination all happen under the map's entry lock, so a
//! destination never has two live loops.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{Instrument, Span};

use crate::error::{DrainFailure, PaceError};
use crate::interfaces::{DestinationId, OutputSink, RateProvider, RewardSink, SenderId};
use crate::scheduler::{drain, Admitted, Destination, DrainReport, OutputCoalescer};
use crate::telemetry::{self, DrainSpan, SpanExt};
use crate::PacerConfig;

/// Handle to a spawned drain loop.
pub type DrainHandle<S> = JoinHandle<Result<DrainReport, DrainFailure<S>>>;

/// Result of an accepted enqueue.
#[derive(Debug)]
pub enum Accepted<S: std::fmt::Debug> {
    /// Text joined a destination whose loop is already draining.
    Queued,
    /// The destination was idle; a new loop was spawned for it.
    Started(DrainHandle<S>),
}

impl<S: std::fmt::Debug> Accepted<S> {
    pub fn started(&self) -> bool {
        matches!(self, Self::Started(_))
    }

    pub fn into_handle(self) -> Option<DrainHandle<S>> {
        match self {
            Self::Started(handle) => Some(handle),
            Self::Queued => None,
        }
    }
}

struct Shared<D, S> {
    destinations: DashMap<D, Arc<Destination<S>>>,
    rates: Arc<dyn RateProvider<S>>,
    rewards: Arc<dyn RewardSink<S>>,
    outputs: Arc<dyn OutputSink<D>>,
    config: PacerConfig,
}

/// Paces text from many senders into many destinations.
///
/// Cheap to clone; clones share the same registry.
pub struct Pacer<D, S> {
    shared: Arc<Shared<D, S>>,
}

impl<D, S> Clone for Pacer<D, S> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<D: DestinationId, S: SenderId> Pacer<D, S> {
    pub fn new(
        config: PacerConfig,
        rates: Arc<dyn RateProvider<S>>,
        rewards: Arc<dyn RewardSink<S>>,
        outputs: Arc<dyn OutputSink<D>>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                destinations: DashMap::new(),
                rates,
                rewards,
                outputs,
                config,
            }),
        }
    }

    pub fn config(&self) -> &PacerConfig {
        &self.shared.config
    }

    /// Queue `text` from `sender` at `destination`.
    ///
    /// The sender's current rate is looked up first. Rejections leave every
    /// buffer untouched.
    pub async fn enqueue(&self, destination: D, sender: S, text: &str) -> Result<Accepted<S>, PaceError> {
        let rate = self
            .shared
            .rates
            .get_rate(&sender)
            .await
            .map_err(PaceError::RateProvider)?;
        self.enqueue_at_rate(destination, sender, rate, text)
    }

    /// Like [`Pacer::enqueue`], with a trailing newline so consecutive
    /// messages land on separate lines.
    pub async fn enqueue_line(&self, destination: D, sender: S, text: &str) -> Result<Accepted<S>, PaceError> {
        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');
        self.enqueue(destination, sender, &line).await
    }

    /// Admission with a rate the caller already looked up.
    pub fn enqueue_at_rate(
        &self,
        destination: D,
        sender: S,
        rate: f64,
        text: &str,
    ) -> Result<Accepted<S>, PaceError> {
        let now = Instant::now();
        let (dest, started) = match self.shared.destinations.entry(destination.clone()) {
            Entry::Occupied(entry) => {
                let dest = Arc::clone(entry.get());
                self.admit(&dest, now, &sender, rate, text)?;
                let started = dest.try_start();
                (dest, started)
            }
            Entry::Vacant(entry) => {
                let dest = Arc::new(Destination::new());
                self.admit(&dest, now, &sender, rate, text)?;
                if !dest.try_start() {
                    // Nothing to pace (empty text); don't register.
                    return Ok(Accepted::Queued);
                }
                entry.insert(Arc::clone(&dest));
                (dest, true)
            }
        };
        telemetry::record_active_destinations(self.shared.destinations.len());

        if !started {
            return Ok(Accepted::Queued);
        }
        Ok(Accepted::Started(self.spawn_drain(destination, dest)))
    }

    fn admit(
        &self,
        dest: &Destination<S>,
        now: Instant,
        sender: &S,
        rate: f64,
        text: &str,
    ) -> Result<Admitted, PaceError> {
        dest.try_enqueue(now, sender, rate, text, self.shared.config.max_queue_wait)
            .map_err(|e| {
                tracing::warn!(sender = ?sender, rate, error = %e, "enqueue rejected");
                telemetry::record_admission_rejection(match e {
                    PaceError::InvalidRate(_) => "invalid_rate",
                    _ => "queue_wait",
                });
                e
            })
    }

    fn spawn_drain(&self, destination: D, dest: Arc<Destination<S>>) -> DrainHandle<S> {
        let shared = Arc::clone(&self.shared);
        let span = DrainSpan::new(&format!("{destination:?}"));

        tokio::spawn(
            async move {
                let mut coalescer = OutputCoalescer::new(
                    destination.clone(),
                    Arc::clone(&shared.outputs),
                    shared.config.flush_interval,
                    shared.config.max_message_length,
                );
                let result = drain(
                    &dest,
                    &mut coalescer,
                    shared.rates.as_ref(),
                    shared.rewards.as_ref(),
                    shared.config.flush_on_drain,
                )
                .await;

                let span = Span::current();
                span.record_result(&result);
                let outcome = match result {
                    Ok(report) => {
                        span.record_report(&report);
                        tracing::info!("destination drained");
                        Ok(report)
                    }
                    Err(error) => {
                        let stranded = dest.strand();
                        tracing::error!(error = %error, stranded = stranded.len(), "drain loop failed");
                        telemetry::record_drain_failure(failure_kind(&error));
                        Err(DrainFailure { error, stranded })
                    }
                };

                shared
                    .destinations
                    .remove_if(&destination, |_, current| Arc::ptr_eq(current, &dest) && current.is_retired());
                telemetry::record_active_destinations(shared.destinations.len());
                outcome
            }
            .instrument(span),
        )
    }

    /// True if `destination` currently has a running loop.
    pub fn is_draining(&self, destination: &D) -> bool {
        self.shared
            .destinations
            .get(destination)
            .map_or(false, |dest| dest.is_draining())
    }

    /// Number of registered destinations.
    pub fn active_destinations(&self) -> usize {
        self.shared.destinations.len()
    }

    /// Unreleased characters for `sender` at `destination`.
    pub fn pending_chars(&self, destination: &D, sender: &S) -> usize {
        self.shared
            .destinations
            .get(destination)
            .map_or(0, |dest| dest.pending_chars(sender))
    }
}

fn failure_kind(error: &PaceError) -> &'static str {
    match error {
        PaceError::Overflow { .. } => "overflow",
        PaceError::Sink(_) => "sink",
        PaceError::RateProvider(_) => "rate_provider",
        PaceError::Reward(_) => "reward",
        PaceError::InvalidRate(_) => "invalid_rate",
        PaceError::TooMuchQueuedText { .. } => "queue_wait",
    }
}
