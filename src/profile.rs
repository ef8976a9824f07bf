//! In-memory sender profiles.
//!
//! Rates are stored in tenths of a character per second so upgrades move
//! in exact 0.1 steps. Every delivered character earns one coin. This is a
//! reference adapter; durable storage belongs to the host.

use std::hash::Hash;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::interfaces::{RateProvider, RewardSink};

/// Rate of a sender with no profile yet: 0.1 chars/s.
pub const DEFAULT_RATE_TENTHS: u32 = 1;
/// Highest stored rate: 2000 chars/s.
pub const MAX_RATE_TENTHS: u32 = 20_000;

/// A sender's typing speed and balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Profile {
    pub rate_tenths: u32,
    pub coins: u64,
}

impl Profile {
    /// Rate in characters per second.
    pub fn rate(&self) -> f64 {
        f64::from(self.rate_tenths) / 10.0
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self { rate_tenths: DEFAULT_RATE_TENTHS, coins: 0 }
    }
}

/// Concurrent profile map keyed by sender.
pub struct ProfileStore<S> {
    profiles: DashMap<S, Profile>,
}

impl<S: Eq + Hash + Clone> ProfileStore<S> {
    pub fn new() -> Self {
        Self { profiles: DashMap::new() }
    }

    /// Profile for `sender`, or the default if none exists.
    pub fn get(&self, sender: &S) -> Profile {
        self.profiles.get(sender).map(|p| *p).unwrap_or_default()
    }

    /// Set the stored rate, clamped to `1..=MAX_RATE_TENTHS`.
    pub fn set_rate_tenths(&self, sender: &S, tenths: u32) {
        let tenths = tenths.clamp(1, MAX_RATE_TENTHS);
        self.profiles.entry(sender.clone()).or_default().rate_tenths = tenths;
    }

    pub fn coins(&self, sender: &S) -> u64 {
        self.get(sender).coins
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl<S: Eq + Hash + Clone> Default for ProfileStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> RateProvider<S> for ProfileStore<S>
where
    S: Eq + Hash + Clone + Send + Sync,
{
    async fn get_rate(&self, sender: &S) -> Result<f64, String> {
        Ok(self.get(sender).rate())
    }
}

#[async_trait]
impl<S> RewardSink<S> for ProfileStore<S>
where
    S: Eq + Hash + Clone + Send + Sync,
{
    async fn on_delivered(&self, sender: &S) -> Result<(), String> {
        self.profiles.entry(sender.clone()).or_default().coins += 1;
        Ok(())
    }
}
