//! Metrics via the `metrics` facade.
//!
//! Nothing is exported unless the host installs a recorder.

use metrics::{counter, describe_counter, describe_gauge, gauge};

const CHARS_RELEASED: &str = "typepace_chars_released_total";
const FLUSHES: &str = "typepace_flushes_total";
const UNITS_CREATED: &str = "typepace_units_created_total";
const ADMISSION_REJECTIONS: &str = "typepace_admission_rejections_total";
const DRAIN_FAILURES: &str = "typepace_drain_failures_total";
const ACTIVE_DESTINATIONS: &str = "typepace_active_destinations";

/// Register metric descriptions with the installed recorder.
pub fn init_metrics() {
    describe_counter!(CHARS_RELEASED, "Characters released by drain loops");
    describe_counter!(FLUSHES, "Accumulator flushes pushed to output sinks");
    describe_counter!(UNITS_CREATED, "Output units created");
    describe_counter!(ADMISSION_REJECTIONS, "Enqueues turned away by admission control");
    describe_counter!(DRAIN_FAILURES, "Drain loops stopped by a fatal error");
    describe_gauge!(ACTIVE_DESTINATIONS, "Destinations with queued or draining text");
}

pub fn record_release() {
    counter!(CHARS_RELEASED).increment(1);
}

pub fn record_flush() {
    counter!(FLUSHES).increment(1);
}

pub fn record_unit_created() {
    counter!(UNITS_CREATED).increment(1);
}

pub fn record_admission_rejection(reason: &'static str) {
    counter!(ADMISSION_REJECTIONS, "reason" => reason).increment(1);
}

pub fn record_drain_failure(kind: &'static str) {
    counter!(DRAIN_FAILURES, "kind" => kind).increment(1);
}

pub fn record_active_destinations(count: usize) {
    gauge!(ACTIVE_DESTINATIONS).set(count as f64);
}
