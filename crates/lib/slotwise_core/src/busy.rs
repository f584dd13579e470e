//! Busy-interval source — boundary to external calendar feeds.
//!
//! The engine owns the contract, not the feeds: given a horizon, a source
//! returns zero or more calendars whose intervals may be unsorted and
//! overlapping. "No feeds configured" is a distinct condition from "feeds
//! configured, nothing busy" — callers must never present an unconfigured
//! source as a fully free calendar.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::clock::Clock;
use crate::interval::TimeInterval;

/// One external feed's busy intervals, as received: possibly unsorted,
/// possibly overlapping.
pub type BusyCalendar = Vec<TimeInterval>;

/// Busy-source errors.
#[derive(Debug, Error)]
pub enum BusyError {
    #[error("no busy-interval feeds configured")]
    Unconfigured,

    #[error("feed fetch failed: {0}")]
    Feed(String),
}

/// A provider of busy intervals for a queried horizon.
#[async_trait]
pub trait BusySource: Send + Sync {
    async fn fetch(&self, horizon: TimeInterval) -> Result<Vec<BusyCalendar>, BusyError>;

    /// Whether any feed is configured at all. Used by health reporting.
    fn is_configured(&self) -> bool;
}

/// Fixed calendars, for tests and local development.
#[derive(Debug, Default)]
pub struct StaticBusySource {
    calendars: Vec<BusyCalendar>,
}

impl StaticBusySource {
    pub fn new(calendars: Vec<BusyCalendar>) -> Self {
        Self { calendars }
    }
}

#[async_trait]
impl BusySource for StaticBusySource {
    async fn fetch(&self, _horizon: TimeInterval) -> Result<Vec<BusyCalendar>, BusyError> {
        Ok(self.calendars.clone())
    }

    fn is_configured(&self) -> bool {
        true
    }
}

/// Wire format served by a feed endpoint. Calendar internals (ICS parsing
/// and the like) live behind the feed; this side only consumes the
/// flattened busy list.
#[derive(Debug, Deserialize)]
struct FeedPayload {
    busy: Vec<TimeInterval>,
}

#[derive(Debug, Clone)]
struct CachedFeed {
    intervals: BusyCalendar,
    horizon: TimeInterval,
    expires_at: DateTime<Utc>,
}

/// Busy source backed by HTTP feeds, with a per-feed TTL cache.
///
/// Whether feed results should be cached across requests is deployment
/// policy, so the TTL is configuration: zero disables caching entirely.
/// Cache entries are only reused for the exact horizon they were fetched
/// for and are expired lazily on the next lookup.
pub struct FeedBusySource {
    client: Client,
    feeds: Vec<Url>,
    cache_ttl: Duration,
    cache: DashMap<String, CachedFeed>,
    clock: Arc<dyn Clock>,
}

impl FeedBusySource {
    pub fn new(client: Client, feeds: Vec<Url>, cache_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            feeds,
            cache_ttl,
            cache: DashMap::new(),
            clock,
        }
    }

    fn cached(&self, feed: &Url, horizon: TimeInterval, now: DateTime<Utc>) -> Option<BusyCalendar> {
        if self.cache_ttl <= Duration::zero() {
            return None;
        }
        let entry = self.cache.get(feed.as_str())?;
        if entry.horizon == horizon && now < entry.expires_at {
            return Some(entry.intervals.clone());
        }
        None
    }

    async fn fetch_feed(&self, feed: &Url, horizon: TimeInterval) -> Result<BusyCalendar, BusyError> {
        let response = self
            .client
            .get(feed.clone())
            .query(&[
                ("start", horizon.start.to_rfc3339()),
                ("end", horizon.end.to_rfc3339()),
            ])
            .send()
            .await
            .map_err(|e| BusyError::Feed(format!("{feed}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BusyError::Feed(format!("{feed}: status {status}")));
        }

        let payload: FeedPayload = response
            .json()
            .await
            .map_err(|e| BusyError::Feed(format!("{feed}: malformed payload: {e}")))?;

        Ok(payload.busy)
    }
}

#[async_trait]
impl BusySource for FeedBusySource {
    async fn fetch(&self, horizon: TimeInterval) -> Result<Vec<BusyCalendar>, BusyError> {
        if self.feeds.is_empty() {
            return Err(BusyError::Unconfigured);
        }

        let now = self.clock.now();
        let mut calendars = Vec::with_capacity(self.feeds.len());
        for feed in &self.feeds {
            // Cache lookups never hold a map guard across the fetch await.
            if let Some(hit) = self.cached(feed, horizon, now) {
                debug!(feed = %feed, "busy feed cache hit");
                calendars.push(hit);
                continue;
            }

            let intervals = self.fetch_feed(feed, horizon).await.inspect_err(|e| {
                warn!(feed = %feed, error = %e, "busy feed fetch failed");
            })?;

            if self.cache_ttl > Duration::zero() {
                self.cache.insert(
                    feed.as_str().to_string(),
                    CachedFeed {
                        intervals: intervals.clone(),
                        horizon,
                        expires_at: now + self.cache_ttl,
                    },
                );
            }
            calendars.push(intervals);
        }

        Ok(calendars)
    }

    fn is_configured(&self) -> bool {
        !self.feeds.is_empty()
    }
}
