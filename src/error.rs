//! Error types for typepace.
//!
//! Admission rejections are recoverable and reported to the caller.
//! Everything else is fatal to the drain loop of the destination it
//! happened on.

use std::fmt::Debug;

use thiserror::Error;

/// Errors raised while admitting or pacing text.
#[derive(Debug, Error)]
pub enum PaceError {
    #[error("too much queued text: {pending} chars at {rate} chars/s exceeds {max_wait_secs}s")]
    TooMuchQueuedText {
        pending: usize,
        rate: f64,
        max_wait_secs: f64,
    },

    #[error("invalid rate {0}: must be finite and positive")]
    InvalidRate(f64),

    /// More than a full output unit arrived between two flushes.
    /// Splitting across several new units is not attempted.
    #[error("output overflow: {remaining} chars left after a split (ceiling {ceiling})")]
    Overflow { remaining: usize, ceiling: usize },

    #[error("output sink failed: {0}")]
    Sink(String),

    #[error("rate provider failed: {0}")]
    RateProvider(String),

    #[error("reward sink failed: {0}")]
    Reward(String),
}

impl PaceError {
    /// Returns true if the caller was turned away and nothing was queued.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::TooMuchQueuedText { .. } | Self::InvalidRate(_))
    }

    /// Returns true if this error ends a destination's drain loop.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Overflow { .. } | Self::Sink(_) | Self::RateProvider(_) | Self::Reward(_)
        )
    }
}

/// A drain loop that stopped on a fatal error.
///
/// `stranded` holds every sender's unreleased text at the moment the loop
/// stopped, so the caller can re-enqueue it.
#[derive(Debug, Error)]
#[error("drain failed with {} stranded sender(s): {error}", .stranded.len())]
pub struct DrainFailure<S: Debug> {
    pub error: PaceError,
    pub stranded: Vec<(S, String)>,
}
