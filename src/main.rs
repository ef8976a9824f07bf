// Copyright 2024-2026 typepace Contributors
// SPDX-License-Identifier: Apache-2.0

//! typepace-cli entry point.
//!
//! ## CLI Subcommands
//!
//! - `typepace-cli` or `typepace-cli pace` - Type stdin out to the console (default)
//! - `typepace-cli config show|defaults|validate` - Inspect configuration
//! - `typepace-cli help [COMMAND]` - Usage
//! - `typepace-cli version` - Version

use std::process::ExitCode;

use typepace::cli::{config_cmd, run_pace, PaceOptions};
use typepace::config as tp_config;
use typepace::telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("pace");

    match command {
        "help" | "--help" | "-h" => {
            if let Some(subcommand) = args.get(2) {
                print_command_help(subcommand);
            } else {
                print_usage();
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("typepace {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        // Bare flags mean `pace`
        "pace" => pace(&args[2..]).await,
        flag if flag.starts_with("--") => pace(&args[1..]).await,
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    let json_output = args.get(3).map(|s| s.as_str()) == Some("--json");
                    ExitCode::from(config_cmd::run_show(json_output) as u8)
                }
                "defaults" => {
                    config_cmd::run_defaults();
                    ExitCode::SUCCESS
                }
                "validate" => ExitCode::from(config_cmd::run_validate() as u8),
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_command_help("config");
                    ExitCode::FAILURE
                }
            }
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

async fn pace(flags: &[String]) -> ExitCode {
    let opts = match PaceOptions::parse(flags) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("{}", e);
            print_command_help("pace");
            return ExitCode::from(2u8);
        }
    };

    let env = tp_config::load();
    if let Err(e) = telemetry::init_logging(&env.log) {
        eprintln!("Logging disabled: {}", e);
    }
    telemetry::init_metrics();

    ExitCode::from(run_pace(&opts, env.pacer).await as u8)
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "typepace - paced character-by-character output v{}

USAGE:
    typepace-cli [COMMAND] [OPTIONS]

COMMANDS:
    pace         Type stdin out to the console (default when no command given)
    config       Inspect configuration (show, defaults, validate)
    version      Show version information
    help         Show this help message

OPTIONS:
    -h, --help     Show help for command
    -V, --version  Show version information

EXAMPLES:
    echo hello | typepace-cli                 # Type at 10 chars/s
    typepace-cli pace --rate 2 < notes.txt    # Slow typist
    typepace-cli config show --json           # Effective configuration

ENVIRONMENT:
    TYPEPACE_FLUSH_INTERVAL_MS    Minimum spacing between output edits (default: 1000)
    TYPEPACE_MAX_MESSAGE_LENGTH   Output unit length ceiling in chars (default: 2000)
    TYPEPACE_MAX_QUEUE_WAIT_SECS  Longest admitted backlog per sender (default: 300)
    TYPEPACE_LOG_LEVEL            Log filter (default: info)
    TYPEPACE_LOG_FORMAT           json or pretty (default: json)
    TYPEPACE_LOG_FILE             Log file path (default: stderr)

EXIT CODES:
    0  Success
    1  Rejected input or pacing failure
    2  Usage error
",
        version
    );
}

/// Print detailed help for a specific command.
fn print_command_help(command: &str) {
    match command {
        "pace" => {
            eprintln!(
                "typepace-cli pace - Type stdin out to the console

USAGE:
    typepace-cli pace [OPTIONS]

OPTIONS:
    --rate N            Characters per second (default: 10), rounded to
                        the nearest 0.1; anything below 0.1 runs at 0.1
    --sender NAME       Sender name (default: stdin)
    --destination NAME  Destination label (default: console)

DESCRIPTION:
    Each input line is queued as one message. Characters are released one
    at a time at the given rate and the output unit is rewritten at most
    once per flush interval. Lines that would take longer than the queue
    wait limit to type are rejected.

EXAMPLES:
    echo hello | typepace-cli pace --rate 4
"
            );
        }
        "config" => {
            eprintln!(
                "typepace-cli config - Inspect configuration

USAGE:
    typepace-cli config [show [--json] | defaults | validate]

DESCRIPTION:
    show      Print effective configuration from environment
    defaults  Print built-in defaults
    validate  Check settings; exit 1 on warnings
"
            );
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
        }
    }
}
