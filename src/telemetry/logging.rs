//! Subscriber setup for the pacer's tracing events.
//!
//! One filter, one formatting layer, one sink: stderr unless a log file is
//! configured.

use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line, human-oriented.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(LogError::UnknownFormat(other.to_string())),
        }
    }
}

/// Where and how drain loops report.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive, e.g. `info` or `typepace::registry=debug`.
    pub level: String,
    /// Log file, truncated on start. `None` means stderr.
    pub output_path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { format: LogFormat::Json, level: "info".to_string(), output_path: None }
    }
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
    #[error("Cannot open log file {path}: {reason}")]
    FileOpen { path: PathBuf, reason: String },
    #[error("Unknown log format: {0}")]
    UnknownFormat(String),
    #[error("Subscriber already initialized")]
    AlreadyInitialized,
}

fn make_writer(path: Option<&PathBuf>) -> Result<BoxMakeWriter, LogError> {
    let Some(path) = path else {
        return Ok(BoxMakeWriter::new(std::io::stderr));
    };
    let file = File::create(path)
        .map_err(|e| LogError::FileOpen { path: path.clone(), reason: e.to_string() })?;
    Ok(BoxMakeWriter::new(Mutex::new(file)))
}

/// Install the global subscriber. Call once, before the first enqueue.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| LogError::InvalidFilter(e.to_string()))?;
    let writer = make_writer(config.output_path.as_ref())?;

    let layer = match config.format {
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(writer).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|_| LogError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" pretty ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!(matches!("xml".parse::<LogFormat>(), Err(LogError::UnknownFormat(_))));
    }

    #[test]
    fn invalid_filter_is_reported() {
        let config = LogConfig { level: "typepace=loud".into(), ..Default::default() };
        assert!(matches!(init_logging(&config), Err(LogError::InvalidFilter(_))));
    }

    #[test]
    fn unopenable_log_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            output_path: Some(dir.path().join("missing").join("pace.log")),
            ..Default::default()
        };
        let err = init_logging(&config).unwrap_err();
        assert!(matches!(err, LogError::FileOpen { .. }));
        assert!(err.to_string().contains("pace.log"));
    }
}
