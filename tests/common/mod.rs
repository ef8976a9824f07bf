//! Shared fakes for pacer integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use typepace::{OutputHandle, OutputSink, Pacer, PacerConfig, RateProvider, RewardSink};

/// Fixed rate per sender; unknown senders get `default`.
pub struct FixedRates {
    rates: Mutex<HashMap<&'static str, f64>>,
    default: f64,
}

impl FixedRates {
    pub fn new(default: f64) -> Self {
        Self { rates: Mutex::new(HashMap::new()), default }
    }

    pub fn set(&self, sender: &'static str, rate: f64) {
        self.rates.lock().insert(sender, rate);
    }
}

#[async_trait]
impl RateProvider<&'static str> for FixedRates {
    async fn get_rate(&self, sender: &&'static str) -> Result<f64, String> {
        Ok(self.rates.lock().get(sender).copied().unwrap_or(self.default))
    }
}

/// Records (sender, time) for every delivered character.
#[derive(Default)]
pub struct RewardLog {
    log: Mutex<Vec<(&'static str, Instant)>>,
}

impl RewardLog {
    pub fn count(&self, sender: &str) -> usize {
        self.log.lock().iter().filter(|(s, _)| *s == sender).count()
    }

    pub fn total(&self) -> usize {
        self.log.lock().len()
    }

    pub fn times(&self, sender: &str) -> Vec<Instant> {
        self.log.lock().iter().filter(|(s, _)| *s == sender).map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl RewardSink<&'static str> for RewardLog {
    async fn on_delivered(&self, sender: &&'static str) -> Result<(), String> {
        self.log.lock().push((*sender, Instant::now()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Send(String),
    Edit(String),
}

/// Output sink that records every call per destination.
#[derive(Default)]
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<(&'static str, Output)>>>,
    broken: Mutex<bool>,
}

impl RecordingSink {
    pub fn broken() -> Self {
        Self { broken: Mutex::new(true), ..Default::default() }
    }

    pub fn repair(&self) {
        *self.broken.lock() = false;
    }

    pub fn outputs(&self, destination: &str) -> Vec<Output> {
        self.calls
            .lock()
            .iter()
            .filter(|(d, _)| *d == destination)
            .map(|(_, o)| o.clone())
            .collect()
    }
}

struct RecordedUnit {
    destination: &'static str,
    calls: Arc<Mutex<Vec<(&'static str, Output)>>>,
}

#[async_trait]
impl OutputHandle for RecordedUnit {
    async fn edit(&mut self, content: &str) -> Result<(), String> {
        self.calls.lock().push((self.destination, Output::Edit(content.to_string())));
        Ok(())
    }
}

#[async_trait]
impl OutputSink<&'static str> for RecordingSink {
    async fn send(
        &self,
        destination: &&'static str,
        content: &str,
    ) -> Result<Box<dyn OutputHandle>, String> {
        if *self.broken.lock() {
            return Err("channel deleted".into());
        }
        self.calls.lock().push((*destination, Output::Send(content.to_string())));
        Ok(Box::new(RecordedUnit { destination: *destination, calls: Arc::clone(&self.calls) }))
    }
}

pub struct Fixture {
    pub pacer: Pacer<&'static str, &'static str>,
    pub rates: Arc<FixedRates>,
    pub rewards: Arc<RewardLog>,
    pub sink: Arc<RecordingSink>,
}

impl Fixture {
    pub fn new(default_rate: f64, config: PacerConfig) -> Self {
        Self::with_sink(default_rate, config, RecordingSink::default())
    }

    pub fn with_sink(default_rate: f64, config: PacerConfig, sink: RecordingSink) -> Self {
        let rates = Arc::new(FixedRates::new(default_rate));
        let rewards = Arc::new(RewardLog::default());
        let sink = Arc::new(sink);
        let pacer = Pacer::new(config, rates.clone(), rewards.clone(), sink.clone());
        Self { pacer, rates, rewards, sink }
    }
}
