//! Market data seam: quote/history lookups and client-side rate limiting.

use crate::types::{PricePoint, Quote};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

/// Free-tier quote APIs allow five requests per minute.
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 5;

/// Source of quotes and price history, keyed by ticker.
pub trait MarketData: Send + Sync {
    /// Latest quote for a symbol.
    fn quote(&self, symbol: &str) -> Result<Quote>;

    /// Daily closing prices for a symbol, oldest first.
    fn history(&self, symbol: &str) -> Result<Vec<PricePoint>>;

    /// Quotes for every symbol that has one. Failed lookups are logged and skipped.
    fn quotes_for(&self, symbols: &[&str]) -> HashMap<String, Quote> {
        symbols
            .iter()
            .filter_map(|symbol| match self.quote(symbol) {
                Ok(quote) => Some((symbol.to_uppercase(), quote)),
                Err(e) => {
                    tracing::warn!(symbol, error = %e, "quote lookup failed");
                    None
                }
            })
            .collect()
    }
}

/// Minimum-spacing rate limiter owned by a single client instance.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::per_minute(DEFAULT_REQUESTS_PER_MINUTE)
    }
}

impl RateLimiter {
    /// Create a limiter enforcing `min_interval` between calls.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: None,
        }
    }

    /// Create a limiter allowing `requests` calls per minute.
    pub fn per_minute(requests: u32) -> Self {
        Self::new(Duration::from_secs(60) / requests.max(1))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// How long a call made at `now` would have to wait.
    pub fn time_until_available(&self, now: Instant) -> Duration {
        match self.last_call {
            Some(last) => self
                .min_interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Record a call at `now` if allowed, returning whether it was.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if self.time_until_available(now).is_zero() {
            self.last_call = Some(now);
            true
        } else {
            false
        }
    }

    /// Block until a call is allowed, then record it.
    pub fn acquire(&mut self) {
        let wait = self.time_until_available(Instant::now());
        if !wait.is_zero() {
            tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limited, sleeping");
            thread::sleep(wait);
        }
        self.last_call = Some(Instant::now());
    }
}

/// A market data source whose calls are spaced by its own [`RateLimiter`].
#[derive(Debug)]
pub struct RateLimited<M> {
    inner: M,
    limiter: Mutex<RateLimiter>,
}

impl<M: MarketData> RateLimited<M> {
    pub fn new(inner: M, limiter: RateLimiter) -> Self {
        Self {
            inner,
            limiter: Mutex::new(limiter),
        }
    }

    fn throttle(&self) {
        let mut limiter = self
            .limiter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        limiter.acquire();
    }
}

impl<M: MarketData> MarketData for RateLimited<M> {
    fn quote(&self, symbol: &str) -> Result<Quote> {
        self.throttle();
        self.inner.quote(symbol)
    }

    fn history(&self, symbol: &str) -> Result<Vec<PricePoint>> {
        self.throttle();
        self.inner.history(symbol)
    }
}

/// In-memory market data, e.g. loaded alongside a portfolio book.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QuoteBook {
    #[serde(default)]
    pub quotes: HashMap<String, Quote>,
    #[serde(default)]
    pub history: BTreeMap<String, Vec<PricePoint>>,
}

impl QuoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a quote, keyed by its uppercase symbol.
    pub fn insert_quote(&mut self, quote: Quote) {
        self.quotes.insert(quote.symbol.to_uppercase(), quote);
    }

    /// Replace the price history of a symbol, sorting it oldest first.
    pub fn insert_history(&mut self, symbol: &str, mut points: Vec<PricePoint>) {
        points.sort_by_key(|p| p.date);
        self.history.insert(symbol.to_uppercase(), points);
    }

    /// Load a quote book exported as JSON.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Pull quotes and histories for `symbols` from `source`.
    ///
    /// Symbols the source cannot serve keep their current data. Returns the
    /// number of quotes updated.
    pub fn refresh(&mut self, source: &dyn MarketData, symbols: &[&str]) -> usize {
        let mut updated = 0;
        for symbol in symbols {
            match source.quote(symbol) {
                Ok(quote) => {
                    self.quotes.insert(symbol.to_uppercase(), quote);
                    updated += 1;
                }
                Err(e) => tracing::warn!(symbol, error = %e, "quote refresh failed"),
            }
            match source.history(symbol) {
                Ok(points) => self.insert_history(symbol, points),
                Err(e) => tracing::debug!(symbol, error = %e, "no history to refresh"),
            }
        }
        updated
    }
}

impl MarketData for QuoteBook {
    fn quote(&self, symbol: &str) -> Result<Quote> {
        self.quotes
            .get(&symbol.to_uppercase())
            .cloned()
            .ok_or_else(|| Error::MissingMarketData(symbol.to_uppercase()))
    }

    fn history(&self, symbol: &str) -> Result<Vec<PricePoint>> {
        self.history
            .get(&symbol.to_uppercase())
            .cloned()
            .ok_or_else(|| Error::MissingMarketData(symbol.to_uppercase()))
    }
}
