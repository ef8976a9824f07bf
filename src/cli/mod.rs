// Copyright 2024-2026 typepace Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI module for typepace commands.
//!
//! ## Usage
//!
//! ```bash
//! typepace-cli pace --rate 4       # Type stdin out at 4 chars/s
//! typepace-cli config show --json  # Effective configuration
//! typepace-cli config validate     # Exit 1 on suspicious settings
//! ```

pub mod config_cmd;
pub mod console;
pub mod pace_cmd;

pub use console::ConsoleSink;
pub use pace_cmd::{run_pace, CliError, PaceOptions};
