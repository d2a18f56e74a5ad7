//! Request pacing for the fetcher and the crawl loop
//!
//! This module handles:
//! - Jittered delays before each request and between pages
//! - Client identity rotation from a configured pool
//!
//! Pacing is behind the [`Pacer`] trait so tests can run with fixed delays and
//! a fixed identity instead of random ones.

use crate::config::{Config, DelayRange, DEFAULT_IDENTITIES};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Source of delays and client identities
pub trait Pacer: Send {
    /// Delay to wait before issuing a request
    fn request_delay(&mut self) -> Duration;

    /// Delay to wait between two pages of a crawl
    fn page_delay(&mut self) -> Duration;

    /// Client identity (User-Agent) for the next request
    fn identity(&mut self) -> String;
}

/// Pacer drawing delays uniformly from jitter ranges and rotating identities
///
/// Every crawl owns its own pacer, so independent crawls keep independent
/// request pacing.
#[derive(Debug, Clone)]
pub struct RandomPacer {
    rng: StdRng,
    request_delay: DelayRange,
    page_delay: DelayRange,
    identities: Vec<String>,
}

impl RandomPacer {
    /// Creates a pacer seeded from system entropy
    pub fn new(request_delay: DelayRange, page_delay: DelayRange, identities: Vec<String>) -> Self {
        Self::with_rng(StdRng::from_entropy(), request_delay, page_delay, identities)
    }

    /// Creates a pacer with a fixed seed; the same seed yields the same draws
    pub fn seeded(
        seed: u64,
        request_delay: DelayRange,
        page_delay: DelayRange,
        identities: Vec<String>,
    ) -> Self {
        Self::with_rng(
            StdRng::seed_from_u64(seed),
            request_delay,
            page_delay,
            identities,
        )
    }

    /// Creates a pacer from the `[crawler]` and `[identity]` tables
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    /// * `seed` - Fixed seed, or None for system entropy
    pub fn from_config(config: &Config, seed: Option<u64>) -> Self {
        let request_delay = config.crawler.request_delay;
        let page_delay = config.crawler.page_delay;
        let identities = config.identity.pool.clone();

        match seed {
            Some(seed) => Self::seeded(seed, request_delay, page_delay, identities),
            None => Self::new(request_delay, page_delay, identities),
        }
    }

    fn with_rng(
        rng: StdRng,
        request_delay: DelayRange,
        page_delay: DelayRange,
        identities: Vec<String>,
    ) -> Self {
        Self {
            rng,
            request_delay,
            page_delay,
            identities,
        }
    }

    fn draw(&mut self, range: DelayRange) -> Duration {
        if range.min >= range.max {
            return Duration::from_millis(range.min);
        }
        Duration::from_millis(self.rng.gen_range(range.min..=range.max))
    }
}

impl Pacer for RandomPacer {
    fn request_delay(&mut self) -> Duration {
        self.draw(self.request_delay)
    }

    fn page_delay(&mut self) -> Duration {
        self.draw(self.page_delay)
    }

    fn identity(&mut self) -> String {
        match self.identities.choose(&mut self.rng) {
            Some(identity) => identity.clone(),
            None => DEFAULT_IDENTITIES[0].to_string(),
        }
    }
}

/// Pacer with constant delays and a single identity
#[derive(Debug, Clone)]
pub struct FixedPacer {
    pub request_delay: Duration,
    pub page_delay: Duration,
    pub identity: String,
}

impl FixedPacer {
    /// No delays at all
    pub fn immediate(identity: impl Into<String>) -> Self {
        Self {
            request_delay: Duration::ZERO,
            page_delay: Duration::ZERO,
            identity: identity.into(),
        }
    }
}

impl Pacer for FixedPacer {
    fn request_delay(&mut self) -> Duration {
        self.request_delay
    }

    fn page_delay(&mut self) -> Duration {
        self.page_delay
    }

    fn identity(&mut self) -> String {
        self.identity.clone()
    }
}
