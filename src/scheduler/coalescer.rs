//! Output coalescing.
//!
//! Released characters accumulate here and are pushed to the destination
//! at most once per flush interval. Every flush resends the full content
//! of the current output unit. When the content outgrows the length
//! ceiling, the unit is closed at exactly `ceiling` characters and the
//! remainder starts a new unit.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::PaceError;
use crate::interfaces::{OutputHandle, OutputSink};
use crate::telemetry;

/// Accumulates released characters for one destination.
pub struct OutputCoalescer<D> {
    destination: D,
    sink: Arc<dyn OutputSink<D>>,
    interval: Duration,
    ceiling: usize,
    accumulator: String,
    /// Length of `accumulator` in chars.
    chars: usize,
    unit: Option<Box<dyn OutputHandle>>,
    last_flush: Option<Instant>,
    dirty: bool,
    flushes: u64,
    units: u64,
}

impl<D> OutputCoalescer<D> {
    pub fn new(destination: D, sink: Arc<dyn OutputSink<D>>, interval: Duration, ceiling: usize) -> Self {
        Self {
            destination,
            sink,
            interval,
            ceiling: ceiling.max(1),
            accumulator: String::new(),
            chars: 0,
            unit: None,
            last_flush: None,
            dirty: false,
            flushes: 0,
            units: 0,
        }
    }

    /// Append one released character.
    pub fn push(&mut self, c: char) {
        self.accumulator.push(c);
        self.chars += 1;
        self.dirty = true;
    }

    /// Content of the current output unit, flushed or not.
    pub fn content(&self) -> &str {
        &self.accumulator
    }

    /// True if characters arrived since the last flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Earliest instant the next flush is allowed.
    pub fn next_flush_at(&self) -> Option<Instant> {
        self.last_flush.map(|at| at + self.interval)
    }

    /// True if a flush at `now` respects the interval cap.
    pub fn flush_due(&self, now: Instant) -> bool {
        self.next_flush_at().map_or(true, |at| now >= at)
    }

    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    pub fn units(&self) -> u64 {
        self.units
    }
}

impl<D: Send + Sync> OutputCoalescer<D> {
    /// Flush if the interval since the previous flush has elapsed.
    pub async fn maybe_flush(&mut self, now: Instant) -> Result<bool, PaceError> {
        if !self.flush_due(now) {
            return Ok(false);
        }
        self.flush(now).await?;
        Ok(true)
    }

    /// Push the accumulator to the sink, splitting past the ceiling.
    pub async fn flush(&mut self, now: Instant) -> Result<(), PaceError> {
        self.last_flush = Some(now);
        self.flushes += 1;
        telemetry::record_flush();

        if self.chars > self.ceiling {
            self.split().await?;
        }

        match self.unit.as_mut() {
            Some(unit) => unit.edit(&self.accumulator).await.map_err(PaceError::Sink)?,
            None => {
                let unit = self.create(&self.accumulator).await?;
                self.unit = Some(unit);
                self.units += 1;
            }
        }
        self.dirty = false;
        tracing::debug!(chars = self.chars, flushes = self.flushes, "flushed");
        Ok(())
    }

    /// Close the current unit at the ceiling and keep the remainder.
    async fn split(&mut self) -> Result<(), PaceError> {
        let cut = self
            .accumulator
            .char_indices()
            .nth(self.ceiling)
            .map_or(self.accumulator.len(), |(idx, _)| idx);

        match self.unit.take() {
            Some(mut unit) => unit.edit(&self.accumulator[..cut]).await.map_err(PaceError::Sink)?,
            None => {
                self.create(&self.accumulator[..cut]).await?;
                self.units += 1;
            }
        }
        self.accumulator.drain(..cut);
        self.chars -= self.ceiling;
        tracing::debug!(remaining = self.chars, ceiling = self.ceiling, "output unit split");

        if self.chars > self.ceiling {
            return Err(PaceError::Overflow { remaining: self.chars, ceiling: self.ceiling });
        }
        Ok(())
    }

    async fn create(&self, content: &str) -> Result<Box<dyn OutputHandle>, PaceError> {
        let unit = self
            .sink
            .send(&self.destination, content)
            .await
            .map_err(PaceError::Sink)?;
        telemetry::record_unit_created();
        Ok(unit)
    }
}
