//! Fixed-window request rate limiter keyed by client identity.
//!
//! Per-key state lives in a `DashMap`; the shard guard is held across the
//! reset-check-and-increment so concurrent calls for one key cannot
//! undercount. The limiter itself never errors: when window arithmetic
//! cannot be represented it fails closed and denies the request.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::warn;

use crate::clock::Clock;

/// Limiter tuning. One window/limit pair applies to every key.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiterConfig {
    pub window: Duration,
    pub max_per_window: u32,
}

/// Outcome of a single `allow` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub ok: bool,
    /// When the current window ends and the count resets.
    pub reset_at: DateTime<Utc>,
    /// Requests left in the window after this one.
    pub remaining: u32,
}

impl RateDecision {
    /// Whole seconds until the window resets, suitable for `Retry-After`.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.reset_at - now).num_seconds().max(0)
    }
}

#[derive(Debug)]
struct WindowState {
    window_start: DateTime<Utc>,
    count: u32,
}

/// Process-wide fixed-window limiter with an injected clock.
pub struct RateLimiter {
    config: RateLimiterConfig,
    clock: Arc<dyn Clock>,
    windows: DashMap<String, WindowState>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            windows: DashMap::new(),
        }
    }

    /// Record one request for `key` and decide whether it may proceed.
    ///
    /// If at least one window length has elapsed since the key's window
    /// started, the counter resets and a fresh window begins at `now`.
    pub fn allow(&self, key: &str) -> RateDecision {
        let now = self.clock.now();
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| WindowState {
                window_start: now,
                count: 0,
            });
        let state = entry.value_mut();

        if now - state.window_start >= self.config.window {
            state.window_start = now;
            state.count = 0;
        }
        state.count = state.count.saturating_add(1);

        let Some(reset_at) = state.window_start.checked_add_signed(self.config.window) else {
            // Fail closed: an unrepresentable window end denies the request.
            warn!(key, "rate window end overflows; denying");
            return RateDecision {
                ok: false,
                reset_at: now,
                remaining: 0,
            };
        };

        RateDecision {
            ok: state.count <= self.config.max_per_window,
            reset_at,
            remaining: self.config.max_per_window.saturating_sub(state.count),
        }
    }

    /// Drop keys whose window has fully elapsed. Reclamation is lazy and
    /// imprecise on purpose; a key that reappears simply starts a fresh
    /// window.
    pub fn purge_expired(&self) {
        let now = self.clock.now();
        self.windows
            .retain(|_, state| now - state.window_start < self.config.window);
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Background sweep so abandoned keys do not accumulate forever.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let limiter = Arc::clone(self);
        let period = std::time::Duration::from_secs(60);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                limiter.purge_expired();
            }
        })
    }
}
