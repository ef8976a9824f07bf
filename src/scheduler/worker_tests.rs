//! Tests for the drain loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use super::*;
use crate::interfaces::{OutputHandle, OutputSink};

const WAIT: Duration = Duration::from_secs(300);

/// Rates per sender, changeable mid-drain, optionally failing.
#[derive(Default)]
struct ScriptedRates {
    rates: Mutex<HashMap<u32, Vec<f64>>>,
    fail: Mutex<bool>,
}

impl ScriptedRates {
    /// Successive calls for `sender` return `rates` in order; the last repeats.
    fn set(&self, sender: u32, rates: &[f64]) {
        self.rates.lock().insert(sender, rates.to_vec());
    }
}

#[async_trait]
impl RateProvider<u32> for ScriptedRates {
    async fn get_rate(&self, sender: &u32) -> Result<f64, String> {
        if *self.fail.lock() {
            return Err("profile lookup failed".into());
        }
        let mut rates = self.rates.lock();
        let script = rates.get_mut(sender).ok_or("unknown sender")?;
        if script.len() > 1 {
            Ok(script.remove(0))
        } else {
            Ok(script[0])
        }
    }
}

/// Records (sender, time) for every delivered character.
#[derive(Default)]
struct Deliveries {
    log: Mutex<Vec<(u32, Instant)>>,
}

impl Deliveries {
    fn times(&self, sender: u32) -> Vec<Instant> {
        self.log.lock().iter().filter(|(s, _)| *s == sender).map(|(_, t)| *t).collect()
    }

    fn count_until(&self, sender: u32, until: Instant) -> usize {
        self.times(sender).into_iter().filter(|t| *t <= until).count()
    }
}

#[async_trait]
impl RewardSink<u32> for Deliveries {
    async fn on_delivered(&self, sender: &u32) -> Result<(), String> {
        self.log.lock().push((*sender, Instant::now()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Output {
    Send(String),
    Edit(String),
}

#[derive(Default)]
struct Screen {
    calls: Arc<Mutex<Vec<(Instant, Output)>>>,
    broken: bool,
}

struct ScreenUnit {
    calls: Arc<Mutex<Vec<(Instant, Output)>>>,
}

#[async_trait]
impl OutputHandle for ScreenUnit {
    async fn edit(&mut self, content: &str) -> Result<(), String> {
        self.calls.lock().push((Instant::now(), Output::Edit(content.to_string())));
        Ok(())
    }
}

#[async_trait]
impl OutputSink<&'static str> for Screen {
    async fn send(
        &self,
        _: &&'static str,
        content: &str,
    ) -> Result<Box<dyn OutputHandle>, String> {
        if self.broken {
            return Err("missing permissions".into());
        }
        self.calls.lock().push((Instant::now(), Output::Send(content.to_string())));
        Ok(Box::new(ScreenUnit { calls: Arc::clone(&self.calls) }))
    }
}

struct Harness {
    dest: Destination<u32>,
    rates: ScriptedRates,
    deliveries: Deliveries,
    calls: Arc<Mutex<Vec<(Instant, Output)>>>,
    coalescer: OutputCoalescer<&'static str>,
    t0: Instant,
}

fn harness(ceiling: usize, broken: bool) -> Harness {
    let screen = Screen { broken, ..Default::default() };
    let calls = Arc::clone(&screen.calls);
    let sink: Arc<dyn OutputSink<&'static str>> = Arc::new(screen);
    Harness {
        dest: Destination::new(),
        rates: ScriptedRates::default(),
        deliveries: Deliveries::default(),
        calls,
        coalescer: OutputCoalescer::new("general", sink, Duration::from_secs(1), ceiling),
        t0: Instant::now(),
    }
}

impl Harness {
    fn enqueue(&self, sender: u32, rate: f64, text: &str) {
        self.dest.try_enqueue(Instant::now(), &sender, rate, text, WAIT).unwrap();
    }

    async fn run(&mut self, flush_on_drain: bool) -> Result<DrainReport, PaceError> {
        assert!(self.dest.try_start());
        drain(&self.dest, &mut self.coalescer, &self.rates, &self.deliveries, flush_on_drain).await
    }

    fn outputs(&self) -> Vec<Output> {
        self.calls.lock().iter().map(|(_, o)| o.clone()).collect()
    }
}

#[tokio::test(start_paused = true)]
async fn two_chars_at_rate_two_flush_once() {
    let mut h = harness(2000, false);
    h.rates.set(1, &[2.0]);
    h.enqueue(1, 2.0, "ab");

    let report = h.run(false).await.unwrap();

    assert_eq!(
        h.deliveries.times(1),
        vec![h.t0 + Duration::from_millis(500), h.t0 + Duration::from_millis(1000)]
    );
    assert_eq!(report, DrainReport { released: 2, flushes: 1, units: 1 });
    assert_eq!(h.coalescer.content(), "ab");
    assert_eq!(h.outputs(), vec![Output::Send("a".into())]);
    assert!(h.dest.is_retired());
}

#[tokio::test(start_paused = true)]
async fn flush_on_drain_shows_the_tail() {
    let mut h = harness(2000, false);
    h.rates.set(1, &[2.0]);
    h.enqueue(1, 2.0, "ab");

    let report = h.run(true).await.unwrap();

    assert_eq!(report.flushes, 2);
    let calls = h.calls.lock().clone();
    assert_eq!(calls[1], (h.t0 + Duration::from_millis(1500), Output::Edit("ab".into())));
}

#[tokio::test(start_paused = true)]
async fn flushes_are_at_least_one_interval_apart() {
    let mut h = harness(2000, false);
    h.rates.set(1, &[10.0]);
    h.enqueue(1, 10.0, &"x".repeat(45));

    let report = h.run(true).await.unwrap();
    assert_eq!(report.released, 45);

    let times: Vec<Instant> = h.calls.lock().iter().map(|(t, _)| *t).collect();
    assert!(times.len() >= 4);
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_secs(1));
    }
}

#[tokio::test(start_paused = true)]
async fn faster_sender_releases_more_in_a_window() {
    let mut h = harness(2000, false);
    h.rates.set(1, &[1.0]);
    h.rates.set(2, &[4.0]);
    h.enqueue(1, 1.0, "slow");
    h.enqueue(2, 4.0, "quick brown fox!");

    h.run(false).await.unwrap();

    for secs in 1..=4 {
        let until = h.t0 + Duration::from_secs(secs);
        assert!(h.deliveries.count_until(2, until) >= h.deliveries.count_until(1, until));
    }
    assert_eq!(h.deliveries.count_until(2, h.t0 + Duration::from_secs(4)), 16);
    assert_eq!(h.deliveries.count_until(1, h.t0 + Duration::from_secs(4)), 4);
}

#[tokio::test(start_paused = true)]
async fn senders_are_fifo_and_interleaved_by_due_time() {
    let mut h = harness(2000, false);
    h.rates.set(1, &[1.0]);
    h.rates.set(2, &[2.0]);
    h.enqueue(1, 1.0, "AB");
    h.enqueue(2, 2.0, "wxyz");

    h.run(true).await.unwrap();

    // 2@0.5 w, 1@1.0 A, 2@1.0 x (tie: lower sender first), 2@1.5 y, 1@2.0 B, 2@2.0 z
    assert_eq!(h.coalescer.content(), "wAxyBz");
}

#[tokio::test(start_paused = true)]
async fn rate_change_applies_to_in_flight_text() {
    let mut h = harness(2000, false);
    // Admitted at 1 char/s; the provider has since been upgraded to 4.
    h.rates.set(1, &[4.0]);
    h.enqueue(1, 1.0, "abc");

    h.run(false).await.unwrap();

    assert_eq!(
        h.deliveries.times(1),
        vec![
            h.t0 + Duration::from_millis(1000),
            h.t0 + Duration::from_millis(1250),
            h.t0 + Duration::from_millis(1500),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn sink_failure_is_fatal() {
    let mut h = harness(2000, true);
    h.rates.set(1, &[1.0]);
    h.enqueue(1, 1.0, "abc");

    let err = h.run(false).await.unwrap_err();
    assert!(matches!(err, PaceError::Sink(_)));
    // The failing character was released; the rest stays buffered.
    assert_eq!(h.dest.strand(), vec![(1, "bc".to_string())]);
    assert!(h.deliveries.times(1).is_empty());
}

#[tokio::test(start_paused = true)]
async fn rate_provider_failure_is_fatal() {
    let mut h = harness(2000, false);
    h.rates.set(1, &[1.0]);
    *h.rates.fail.lock() = true;
    h.enqueue(1, 1.0, "ab");

    let err = h.run(false).await.unwrap_err();
    assert!(matches!(err, PaceError::RateProvider(_)));
}

#[tokio::test(start_paused = true)]
async fn zero_rate_mid_drain_is_fatal() {
    let mut h = harness(2000, false);
    h.rates.set(1, &[0.0]);
    h.enqueue(1, 1.0, "ab");

    let err = h.run(false).await.unwrap_err();
    assert!(matches!(err, PaceError::RateProvider(ref msg) if msg == "invalid rate 0"));
    assert!(err.is_fatal());
    assert!(!err.is_rejection());
}

#[tokio::test(start_paused = true)]
async fn zero_rate_on_last_char_is_harmless() {
    let mut h = harness(2000, false);
    h.rates.set(1, &[0.0]);
    h.enqueue(1, 1.0, "a");

    assert_eq!(h.run(false).await.unwrap().released, 1);
}

#[tokio::test(start_paused = true)]
async fn growth_past_two_units_between_flushes_overflows() {
    let mut h = harness(3, false);
    h.rates.set(1, &[10.0]);
    h.enqueue(1, 10.0, &"y".repeat(20));

    let err = h.run(false).await.unwrap_err();
    assert!(matches!(err, PaceError::Overflow { ceiling: 3, .. }));
    for output in h.outputs() {
        let (Output::Send(text) | Output::Edit(text)) = output;
        assert!(text.chars().count() <= 3);
    }
}

#[tokio::test(start_paused = true)]
async fn splits_into_new_unit_past_the_ceiling() {
    let mut h = harness(5, false);
    h.rates.set(1, &[4.0]);
    h.enqueue(1, 4.0, "abcdefgh");

    let report = h.run(true).await.unwrap();

    assert_eq!(report, DrainReport { released: 8, flushes: 3, units: 2 });
    assert_eq!(
        h.outputs(),
        vec![
            Output::Send("a".into()),
            Output::Edit("abcde".into()),
            Output::Edit("abcde".into()),
            Output::Send("fgh".into()),
        ]
    );
    assert_eq!(h.coalescer.content(), "fgh");
}
