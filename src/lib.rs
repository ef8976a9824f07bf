//! typepace
//!
//! Paces text into rate-limited outputs one character at a time, at a
//! per-sender typing speed.
//!
//! # Model
//!
//! - **Sender**: queues text; its rate (chars/s) decides how fast it types.
//! - **Destination**: a shared output (e.g. a chat channel). Senders on the
//!   same destination interleave by due time.
//! - **Output unit**: one editable message. Released characters are
//!   coalesced and written at most once per flush interval; a unit past the
//!   length ceiling is closed and a new one started.
//!
//! Rates, rewards and output are injected through the traits in
//! [`interfaces`]. Whether a sender may post at all is the caller's call.

pub mod cli;
pub mod config;
pub mod error;
pub mod interfaces;
pub mod profile;
pub mod registry;
pub mod scheduler;
pub mod telemetry;

use std::time::Duration;

pub use error::{DrainFailure, PaceError};
pub use interfaces::{DestinationId, OutputHandle, OutputSink, RateProvider, RewardSink, SenderId};
pub use profile::{Profile, ProfileStore};
pub use registry::{Accepted, DrainHandle, Pacer};
pub use scheduler::DrainReport;

/// Default minimum spacing between two flushes of one destination.
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(1);
/// Default output unit length ceiling, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;
/// Default longest a sender's queued text may take to type out.
pub const MAX_QUEUE_WAIT: Duration = Duration::from_secs(300);

/// Pacing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacerConfig {
    /// Minimum spacing between two flushes of one destination.
    pub flush_interval: Duration,
    /// Output unit length ceiling, in characters.
    pub max_message_length: usize,
    /// Longest a sender's queued text may take to type out.
    pub max_queue_wait: Duration,
    /// Flush once more after the queue empties so the tail is shown.
    pub flush_on_drain: bool,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            flush_interval: FLUSH_INTERVAL,
            max_message_length: MAX_MESSAGE_LENGTH,
            max_queue_wait: MAX_QUEUE_WAIT,
            flush_on_drain: false,
        }
    }
}
