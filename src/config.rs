//! Configuration loading from environment variables.
//!
//! All configuration values are loaded from `TYPEPACE_*` environment
//! variables with sensible defaults. Invalid values fall back to defaults
//! without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `TYPEPACE_FLUSH_INTERVAL_MS` | 1000 | Minimum spacing between flushes (ms) |
//! | `TYPEPACE_MAX_MESSAGE_LENGTH` | 2000 | Output unit length ceiling (chars) |
//! | `TYPEPACE_MAX_QUEUE_WAIT_SECS` | 300 | Longest admitted backlog per sender (secs) |
//! | `TYPEPACE_FLUSH_ON_DRAIN` | false | Flush the tail once the queue empties |
//! | `TYPEPACE_LOG_LEVEL` | info | Log filter directive |
//! | `TYPEPACE_LOG_FORMAT` | json | `json` or `pretty` |
//! | `TYPEPACE_LOG_FILE` | unset | Write logs to this file instead of stderr |

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::telemetry::{LogConfig, LogFormat};
use crate::PacerConfig;

/// Effective configuration summary (serializable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    pub flush_interval_ms: u64,
    pub max_message_length: usize,
    pub max_queue_wait_secs: u64,
    pub flush_on_drain: bool,
    pub log_level: String,
    pub log_format: LogFormat,
    pub log_file: Option<String>,
}

/// All configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub pacer: PacerConfig,
    pub log: LogConfig,
}

/// Parse a `usize` env var, returning `default` on missing or invalid.
fn parse_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a boolean env var (`1/0`, `true/false`, `yes/no`, `on/off`).
fn parse_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Load pacing configuration from environment.
fn load_pacer_config() -> PacerConfig {
    let interval_ms = parse_u64("TYPEPACE_FLUSH_INTERVAL_MS", 1000);
    let max_message_length = parse_usize("TYPEPACE_MAX_MESSAGE_LENGTH", 2000);
    let wait_secs = parse_u64("TYPEPACE_MAX_QUEUE_WAIT_SECS", 300);
    let interval_ms = interval_ms.max(1); // floor: 1ms
    let max_message_length = max_message_length.max(1);
    let wait_secs = wait_secs.max(1);
    PacerConfig {
        flush_interval: Duration::from_millis(interval_ms),
        max_message_length,
        max_queue_wait: Duration::from_secs(wait_secs),
        flush_on_drain: parse_bool("TYPEPACE_FLUSH_ON_DRAIN", false),
    }
}

/// Load logging configuration from environment.
fn load_log_config() -> LogConfig {
    let level = std::env::var("TYPEPACE_LOG_LEVEL")
        .ok()
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| "info".to_string());
    let format = std::env::var("TYPEPACE_LOG_FORMAT")
        .ok()
        .and_then(|f| f.parse::<LogFormat>().ok())
        .unwrap_or_default();
    let output_path = std::env::var("TYPEPACE_LOG_FILE")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    LogConfig { format, level, output_path }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> EnvConfig {
    EnvConfig {
        pacer: load_pacer_config(),
        log: load_log_config(),
    }
}

impl EnvConfig {
    /// Return a serializable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            flush_interval_ms: self.pacer.flush_interval.as_millis() as u64,
            max_message_length: self.pacer.max_message_length,
            max_queue_wait_secs: self.pacer.max_queue_wait.as_secs(),
            flush_on_drain: self.pacer.flush_on_drain,
            log_level: self.log.level.clone(),
            log_format: self.log.format,
            log_file: self.log.output_path.as_ref().map(|p| p.display().to_string()),
        }
    }
}

/// Serializes env-mutating tests across modules.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
pub(crate) const ENV_KEYS: &[&str] = &[
    "TYPEPACE_FLUSH_INTERVAL_MS",
    "TYPEPACE_MAX_MESSAGE_LENGTH",
    "TYPEPACE_MAX_QUEUE_WAIT_SECS",
    "TYPEPACE_FLUSH_ON_DRAIN",
    "TYPEPACE_LOG_LEVEL",
    "TYPEPACE_LOG_FORMAT",
    "TYPEPACE_LOG_FILE",
];

#[cfg(test)]
pub(crate) fn clear_env_vars() {
    for k in ENV_KEYS {
        std::env::remove_var(k);
    }
}
