// Copyright 2024-2026 typepace Contributors
// SPDX-License-Identifier: Apache-2.0

//! Config CLI subcommands: show, defaults, validate.
//!
//! These commands read configuration directly from environment variables.

use tracing_subscriber::EnvFilter;

use crate::config::{self, EffectiveConfig};
use crate::telemetry::LogFormat;

/// Print effective config to stdout, as key-value pairs or JSON.
pub fn run_show(json: bool) -> i32 {
    let cfg = config::load().effective_config();
    if !json {
        print_config(&cfg);
        return 0;
    }
    match serde_json::to_string_pretty(&cfg) {
        Ok(out) => {
            println!("{out}");
            0
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {e}");
            1
        }
    }
}

/// Print default config values (no env overrides) to stdout.
pub fn run_defaults() {
    println!("TYPEPACE_FLUSH_INTERVAL_MS={}", crate::FLUSH_INTERVAL.as_millis());
    println!("TYPEPACE_MAX_MESSAGE_LENGTH={}", crate::MAX_MESSAGE_LENGTH);
    println!("TYPEPACE_MAX_QUEUE_WAIT_SECS={}", crate::MAX_QUEUE_WAIT.as_secs());
    println!("TYPEPACE_FLUSH_ON_DRAIN=false");
    println!("TYPEPACE_LOG_LEVEL=info");
    println!("TYPEPACE_LOG_FORMAT=json");
    println!("TYPEPACE_LOG_FILE=");
}

/// Validate configuration for obvious misconfigurations.
///
/// Returns 0 if valid, 1 if any warnings are found.
pub fn run_validate() -> i32 {
    let cfg = config::load().effective_config();
    let mut warnings = 0;

    if cfg.flush_interval_ms > cfg.max_queue_wait_secs.saturating_mul(1000) {
        eprintln!(
            "WARNING: TYPEPACE_FLUSH_INTERVAL_MS ({}) exceeds TYPEPACE_MAX_QUEUE_WAIT_SECS ({}s)",
            cfg.flush_interval_ms, cfg.max_queue_wait_secs
        );
        warnings += 1;
    }

    if let Err(e) = EnvFilter::try_new(&cfg.log_level) {
        eprintln!("WARNING: TYPEPACE_LOG_LEVEL ({}) is not a valid filter: {e}", cfg.log_level);
        warnings += 1;
    }

    // load() silently falls back on an unknown format
    if let Ok(raw) = std::env::var("TYPEPACE_LOG_FORMAT") {
        if raw.parse::<LogFormat>().is_err() {
            eprintln!("WARNING: TYPEPACE_LOG_FORMAT ({raw}) is unknown; using json");
            warnings += 1;
        }
    }

    if warnings == 0 {
        println!("Configuration is valid.");
        0
    } else {
        1
    }
}

fn print_config(cfg: &EffectiveConfig) {
    let format = match cfg.log_format {
        LogFormat::Json => "json",
        LogFormat::Pretty => "pretty",
    };
    println!("TYPEPACE_FLUSH_INTERVAL_MS={}", cfg.flush_interval_ms);
    println!("TYPEPACE_MAX_MESSAGE_LENGTH={}", cfg.max_message_length);
    println!("TYPEPACE_MAX_QUEUE_WAIT_SECS={}", cfg.max_queue_wait_secs);
    println!("TYPEPACE_FLUSH_ON_DRAIN={}", cfg.flush_on_drain);
    println!("TYPEPACE_LOG_LEVEL={}", cfg.log_level);
    println!("TYPEPACE_LOG_FORMAT={format}");
    println!("TYPEPACE_LOG_FILE={}", cfg.log_file.as_deref().unwrap_or(""));
}
