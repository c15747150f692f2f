//! Rate-limit tracking from Strava response headers
//!
//! Strava reports quota on every response, success or failure, in two
//! headers holding a `short,daily` pair:
//! - usage: requests made in the current 15-minute window and today
//! - limit: the ceilings for the same two windows
//!
//! The tracker keeps the last values seen. Updates overwrite, never
//! accumulate, so replaying a response leaves the state unchanged.

use std::sync::{PoisonError, RwLock};

use common::RateLimitConfig;
use reqwest::header::{HeaderMap, HeaderName};
use tracing::{debug, warn};

use crate::ResponseObserver;
use crate::response::HttpResponse;

/// Snapshot of the caller's quota.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuotaState {
    pub short_term_usage: u32,
    pub short_term_limit: u32,
    pub daily_usage: u32,
    pub daily_limit: u32,
    /// `100 * usage / limit` for the short window; unset while the limit is unknown or zero
    pub short_term_percent: Option<f64>,
    /// `100 * usage / limit` for the day; unset while the limit is unknown or zero
    pub daily_percent: Option<f64>,
}

impl QuotaState {
    pub fn short_term_remaining(&self) -> u32 {
        self.short_term_limit.saturating_sub(self.short_term_usage)
    }

    pub fn daily_remaining(&self) -> u32 {
        self.daily_limit.saturating_sub(self.daily_usage)
    }

    fn recompute(&mut self) {
        self.short_term_percent = percent(self.short_term_usage, self.short_term_limit);
        self.daily_percent = percent(self.daily_usage, self.daily_limit);
    }
}

fn percent(usage: u32, limit: u32) -> Option<f64> {
    (limit > 0).then(|| f64::from(usage) * 100.0 / f64::from(limit))
}

/// Owned quota state, updated from response headers.
///
/// All six values sit behind one lock so a snapshot never mixes two
/// responses.
#[derive(Debug)]
pub struct QuotaTracker {
    usage_header: HeaderName,
    limit_header: HeaderName,
    state: RwLock<QuotaState>,
}

impl QuotaTracker {
    /// Fails when a configured header name isn't a valid HTTP header name.
    pub fn new(config: &RateLimitConfig) -> common::Result<Self> {
        Ok(Self {
            usage_header: config.usage_header()?,
            limit_header: config.limit_header()?,
            state: RwLock::new(QuotaState::default()),
        })
    }

    pub fn snapshot(&self) -> QuotaState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply the quota headers present in `headers`. Malformed values are
    /// logged and skipped.
    pub fn update(&self, headers: &HeaderMap) {
        let usage = read_pair(headers, &self.usage_header);
        let limit = read_pair(headers, &self.limit_header);

        if usage.is_none() && limit.is_none() {
            return;
        }

        let updated = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if let Some((short, daily)) = usage {
                state.short_term_usage = short;
                state.daily_usage = daily;
            }
            if let Some((short, daily)) = limit {
                state.short_term_limit = short;
                state.daily_limit = daily;
            }
            state.recompute();
            *state
        };

        debug!(
            short_term_usage = updated.short_term_usage,
            short_term_limit = updated.short_term_limit,
            daily_usage = updated.daily_usage,
            daily_limit = updated.daily_limit,
            "rate limit updated"
        );
        publish(&updated);
    }
}

impl ResponseObserver for QuotaTracker {
    fn on_response(&self, response: &HttpResponse) {
        self.update(response.headers());
    }
}

/// Read a `short,daily` pair. Returns `None` (after logging) for anything
/// other than exactly two non-negative integers.
fn read_pair(headers: &HeaderMap, name: &HeaderName) -> Option<(u32, u32)> {
    let value = headers.get(name)?;
    let parsed = value.to_str().ok().and_then(parse_pair);
    if parsed.is_none() {
        warn!(header = %name, value = ?value, "skipping malformed rate limit header");
    }
    parsed
}

fn parse_pair(value: &str) -> Option<(u32, u32)> {
    let mut tokens = value.split(',').map(str::trim);
    let short = tokens.next()?.parse().ok()?;
    let daily = tokens.next()?.parse().ok()?;
    if tokens.next().is_some() {
        return None;
    }
    Some((short, daily))
}

fn publish(state: &QuotaState) {
    metrics::gauge!("strava_rate_limit_usage", "window" => "short_term")
        .set(f64::from(state.short_term_usage));
    metrics::gauge!("strava_rate_limit_usage", "window" => "daily")
        .set(f64::from(state.daily_usage));
    metrics::gauge!("strava_rate_limit_limit", "window" => "short_term")
        .set(f64::from(state.short_term_limit));
    metrics::gauge!("strava_rate_limit_limit", "window" => "daily")
        .set(f64::from(state.daily_limit));
}
