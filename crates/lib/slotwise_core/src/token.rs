//! Double opt-in confirmation tokens: issue, single-use consume, expiry.
//!
//! The store exclusively owns the token→subject mapping; tokens are kept
//! by SHA-256 hash. `consume` is an atomic take: of any number of
//! concurrent calls with the same token, exactly one receives the subject.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use sha2::{Digest, Sha256};

use crate::clock::Clock;

/// Plaintext token length (alphanumeric chars).
const TOKEN_LEN: usize = 64;

/// Store tuning.
#[derive(Debug, Clone, Copy)]
pub struct TokenStoreConfig {
    /// How long an issued token stays redeemable.
    pub ttl: Duration,
}

#[derive(Debug, Clone)]
struct TokenRecord {
    subject: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Generate a random token (64 alphanumeric chars).
fn generate_token() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// SHA-256 hash a token for storage.
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// In-memory confirmation-token store with an injected clock.
pub struct TokenStore {
    config: TokenStoreConfig,
    clock: Arc<dyn Clock>,
    /// token hash → record
    by_hash: DashMap<String, TokenRecord>,
    /// subject email → live token hash (one live token per subject)
    by_subject: DashMap<String, String>,
}

impl TokenStore {
    pub fn new(config: TokenStoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            by_hash: DashMap::new(),
            by_subject: DashMap::new(),
        }
    }

    /// Create a fresh token bound to `subject_email` and return its
    /// plaintext. Any prior unconsumed token for the same subject is
    /// invalidated first.
    pub fn issue(&self, subject_email: &str) -> String {
        let plaintext = generate_token();
        let hash = hash_token(&plaintext);
        let now = self.clock.now();

        if let Some((_, old_hash)) = self.by_subject.remove(subject_email) {
            self.by_hash.remove(&old_hash);
        }
        self.by_hash.insert(
            hash.clone(),
            TokenRecord {
                subject: subject_email.to_string(),
                issued_at: now,
                expires_at: now + self.config.ttl,
            },
        );
        self.by_subject.insert(subject_email.to_string(), hash);

        plaintext
    }

    /// Redeem a token: returns the bound subject exactly once.
    ///
    /// Unknown, already-consumed, and expired tokens are indistinguishable
    /// to the caller (`None`). The removal itself is the atomicity point;
    /// two racing consumers cannot both observe the record.
    pub fn consume(&self, token: &str) -> Option<String> {
        let hash = hash_token(token);
        let (_, record) = self.by_hash.remove(&hash)?;
        // Clear the subject index only if it still points at this token;
        // a re-issue may already have superseded it.
        self.by_subject.remove_if(&record.subject, |_, h| h == &hash);

        if self.clock.now() >= record.expires_at {
            return None;
        }
        Some(record.subject)
    }

    /// Whether `subject_email` currently has a live (unexpired, unconsumed)
    /// token.
    pub fn has_live_token(&self, subject_email: &str) -> bool {
        let Some(hash) = self.by_subject.get(subject_email).map(|h| h.value().clone()) else {
            return false;
        };
        self.by_hash
            .get(&hash)
            .is_some_and(|r| self.clock.now() < r.expires_at)
    }

    /// Number of stored (possibly expired) tokens.
    pub fn stored_tokens(&self) -> usize {
        self.by_hash.len()
    }

    /// Drop expired records. Expired tokens already read as consumed, so
    /// this only bounds memory; it need not be precise.
    pub fn purge_expired(&self) {
        let now = self.clock.now();
        self.by_hash.retain(|_, record| now < record.expires_at);
        self.by_subject
            .retain(|_, hash| self.by_hash.contains_key(hash));
    }

    /// Background sweep companion to lazy expiry.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        let period = std::time::Duration::from_secs(300);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                store.purge_expired();
            }
        })
    }

    /// Age of the oldest stored token, primarily for diagnostics.
    pub fn oldest_issue_instant(&self) -> Option<DateTime<Utc>> {
        self.by_hash
            .iter()
            .map(|entry| entry.issued_at)
            .min()
    }
}
