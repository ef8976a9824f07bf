//! Span utilities and extension traits for drain tracing.
//!
//! Provides standardized span creation and result recording.

use tracing::{info_span, Span};

use crate::scheduler::DrainReport;

/// Extension trait for adding context to spans.
pub trait SpanExt {
    /// Record the result of an operation into the span.
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;

    /// Record drain totals into the span.
    fn record_report(&self, report: &DrainReport);
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }

    fn record_report(&self, report: &DrainReport) {
        self.record("released", report.released);
        self.record("flushes", report.flushes);
        self.record("units", report.units);
    }
}

/// Factory for drain loop spans.
pub struct DrainSpan;

impl DrainSpan {
    /// One span per loop instance.
    ///
    /// `status`, `error.message` and the totals are filled in on exit.
    pub fn new(destination: &str) -> Span {
        info_span!(
            "drain",
            destination = %destination,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
            released = tracing::field::Empty,
            flushes = tracing::field::Empty,
            units = tracing::field::Empty,
        )
    }
}
