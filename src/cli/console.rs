// Copyright 2024-2026 typepace Contributors
// SPDX-License-Identifier: Apache-2.0

//! Console output sink.
//!
//! Every create and edit is written as a framed block so the pacing can be
//! watched on a terminal.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::interfaces::{OutputHandle, OutputSink};

/// Writes output units to any `Write`.
pub struct ConsoleSink<W> {
    writer: Arc<Mutex<W>>,
    next_unit: AtomicU64,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer: Arc::new(Mutex::new(writer)), next_unit: AtomicU64::new(1) }
    }

    /// Shared handle to the underlying writer.
    pub fn writer(&self) -> Arc<Mutex<W>> {
        Arc::clone(&self.writer)
    }
}

fn write_frame<W: Write>(writer: &Mutex<W>, header: &str, content: &str) -> Result<(), String> {
    let mut w = writer.lock();
    writeln!(w, "--- {header} ---").map_err(|e| e.to_string())?;
    writeln!(w, "{content}").map_err(|e| e.to_string())?;
    w.flush().map_err(|e| e.to_string())
}

struct ConsoleUnit<W> {
    writer: Arc<Mutex<W>>,
    label: String,
}

#[async_trait]
impl<W: Write + Send + 'static> OutputHandle for ConsoleUnit<W> {
    async fn edit(&mut self, content: &str) -> Result<(), String> {
        write_frame(&self.writer, &format!("{} (edit)", self.label), content)
    }
}

#[async_trait]
impl<W: Write + Send + 'static> OutputSink<String> for ConsoleSink<W> {
    async fn send(&self, destination: &String, content: &str) -> Result<Box<dyn OutputHandle>, String> {
        let id = self.next_unit.fetch_add(1, Ordering::Relaxed);
        let label = format!("{destination} #{id}");
        write_frame(&self.writer, &label, content)?;
        Ok(Box::new(ConsoleUnit { writer: Arc::clone(&self.writer), label }))
    }
}
