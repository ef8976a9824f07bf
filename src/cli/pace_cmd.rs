// Copyright 2024-2026 typepace Contributors
// SPDX-License-Identifier: Apache-2.0

//! `pace` subcommand: type stdin out to the console at a fixed rate.
//!
//! Each input line is queued as one message from a single sender. The tail
//! of the output is always flushed so the last line is shown in full.

use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::cli::console::ConsoleSink;
use crate::interfaces::OutputSink;
use crate::profile::ProfileStore;
use crate::registry::Pacer;
use crate::PacerConfig;

/// Errors from parsing `pace` arguments.
#[derive(Debug, Error, PartialEq)]
pub enum CliError {
    #[error("Missing value for {0}")]
    MissingValue(&'static str),
    #[error("Invalid value for {flag}: {value}")]
    InvalidValue { flag: &'static str, value: String },
    #[error("Unknown argument: {0}")]
    UnknownArgument(String),
}

/// Options for the `pace` subcommand.
#[derive(Debug, Clone, PartialEq)]
pub struct PaceOptions {
    /// Characters per second. Profiles store 0.1 steps, so this is rounded
    /// to the nearest step and floored at 0.1.
    pub rate: f64,
    pub sender: String,
    pub destination: String,
}

impl Default for PaceOptions {
    fn default() -> Self {
        Self { rate: 10.0, sender: "stdin".to_string(), destination: "console".to_string() }
    }
}

impl PaceOptions {
    /// Parse flags following the subcommand name.
    pub fn parse(args: &[String]) -> Result<Self, CliError> {
        let mut opts = Self::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--rate" => {
                    let value = iter.next().ok_or(CliError::MissingValue("--rate"))?;
                    opts.rate = value
                        .parse::<f64>()
                        .ok()
                        .filter(|r| r.is_finite() && *r > 0.0)
                        .ok_or_else(|| CliError::InvalidValue { flag: "--rate", value: value.clone() })?;
                }
                "--sender" => {
                    opts.sender = iter.next().ok_or(CliError::MissingValue("--sender"))?.clone();
                }
                "--destination" => {
                    opts.destination = iter.next().ok_or(CliError::MissingValue("--destination"))?.clone();
                }
                other => return Err(CliError::UnknownArgument(other.to_string())),
            }
        }
        Ok(opts)
    }

    /// Rate as stored in a profile, in tenths of a char per second.
    fn rate_tenths(&self) -> u32 {
        (self.rate * 10.0).round().clamp(1.0, f64::from(u32::MAX)) as u32
    }
}

/// Pace stdin to stdout. Returns the process exit code.
pub async fn run_pace(opts: &PaceOptions, config: PacerConfig) -> i32 {
    let stdin = BufReader::new(tokio::io::stdin());
    run_pace_from(opts, config, stdin, Arc::new(ConsoleSink::stdout())).await
}

/// Pace every line of `input` into `sink`.
pub async fn run_pace_from<R>(
    opts: &PaceOptions,
    config: PacerConfig,
    input: R,
    sink: Arc<dyn OutputSink<String>>,
) -> i32
where
    R: AsyncBufRead + Unpin,
{
    let profiles = Arc::new(ProfileStore::new());
    profiles.set_rate_tenths(&opts.sender, opts.rate_tenths());

    let config = PacerConfig { flush_on_drain: true, ..config };
    let pacer: Pacer<String, String> = Pacer::new(config, profiles.clone(), profiles.clone(), sink);

    let mut code = 0;
    let mut handles = Vec::new();
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                eprintln!("Failed to read input: {e}");
                code = 1;
                break;
            }
        };
        match pacer.enqueue_line(opts.destination.clone(), opts.sender.clone(), &line).await {
            Ok(accepted) => handles.extend(accepted.into_handle()),
            Err(e) => {
                eprintln!("Line rejected: {e}");
                code = 1;
            }
        }
    }

    for joined in join_all(handles).await {
        match joined {
            Ok(Ok(report)) => {
                tracing::debug!(released = report.released, flushes = report.flushes, "drain finished");
            }
            Ok(Err(failure)) => {
                eprintln!("Pacing failed: {failure}");
                code = 1;
            }
            Err(e) => {
                eprintln!("Drain task aborted: {e}");
                code = 1;
            }
        }
    }

    eprintln!("{} earned {} coin(s)", opts.sender, profiles.coins(&opts.sender));
    code
}
