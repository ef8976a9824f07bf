//! Admission control and due-time arithmetic.
//!
//! A sender may not queue more text than it can type out within the
//! maximum queue wait at its current rate.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::PaceError;

/// Reject rates that are not finite and positive.
pub fn validate_rate(rate: f64) -> Result<f64, PaceError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(PaceError::InvalidRate(rate))
    }
}

/// Time between two characters at `rate` chars/s.
pub fn char_interval(rate: f64) -> Result<Duration, PaceError> {
    let rate = validate_rate(rate)?;
    Duration::try_from_secs_f64(1.0 / rate).map_err(|_| PaceError::InvalidRate(rate))
}

/// Due time of the character after one due at `from`.
pub fn next_due(from: Instant, rate: f64) -> Result<Instant, PaceError> {
    from.checked_add(char_interval(rate)?)
        .ok_or(PaceError::InvalidRate(rate))
}

/// Check whether `incoming` more characters fit in the sender's wait budget.
///
/// `pending` is what the sender already has buffered at this destination.
pub fn check(
    pending: usize,
    incoming: usize,
    rate: f64,
    max_wait: Duration,
) -> Result<(), PaceError> {
    let rate = validate_rate(rate)?;
    let total = pending + incoming;
    let max_wait_secs = max_wait.as_secs_f64();
    if total as f64 / rate > max_wait_secs {
        return Err(PaceError::TooMuchQueuedText { pending: total, rate, max_wait_secs });
    }
    Ok(())
}
