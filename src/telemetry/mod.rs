//! Telemetry for typepace.
//!
//! Structured logging, drain spans and metrics counters.

mod logging;
mod metrics;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use self::metrics::{
    init_metrics, record_active_destinations, record_admission_rejection, record_drain_failure,
    record_flush, record_release, record_unit_created,
};
pub use spans::{DrainSpan, SpanExt};
