//! Contact-store boundary — the external CRM holding subscriber records.
//!
//! The engine never persists contacts itself; it upserts by email (the
//! upstream guarantees a second identical upsert creates no duplicate) and
//! flips the confirmed flag after a successful token consume.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Contact-store errors.
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("contact store request failed: {0}")]
    Transport(String),

    #[error("contact store returned status {0}")]
    Status(u16),
}

/// External subscriber storage.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Create-or-update the contact keyed by `email`, in pending state,
    /// carrying the confirmation token for the upstream's opt-in mailing.
    /// Idempotent: repeated calls for one email never create duplicates.
    async fn upsert_pending(
        &self,
        email: &str,
        source: &str,
        confirm_token: &str,
    ) -> Result<(), ContactError>;

    /// Mark the contact confirmed. Called only after a token consume.
    async fn mark_confirmed(&self, email: &str) -> Result<(), ContactError>;
}

#[derive(Debug, Serialize)]
struct UpsertBody<'a> {
    email: &'a str,
    source: &'a str,
    status: &'a str,
    #[serde(rename = "confirmToken")]
    confirm_token: &'a str,
}

/// Contact store backed by a CRM-style REST API with bearer-token auth.
pub struct HttpContactStore {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl HttpContactStore {
    pub fn new(client: Client, base_url: Url, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn contact_url(&self, email: &str, suffix: &str) -> Result<Url, ContactError> {
        self.base_url
            .join(&format!("contacts/{email}{suffix}"))
            .map_err(|e| ContactError::Transport(e.to_string()))
    }

    async fn send_upsert(&self, url: Url, body: &UpsertBody<'_>) -> Result<(), ContactError> {
        let response = self
            .client
            .put(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ContactError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ContactError::Status(status.as_u16()))
        }
    }
}

#[async_trait]
impl ContactStore for HttpContactStore {
    async fn upsert_pending(
        &self,
        email: &str,
        source: &str,
        confirm_token: &str,
    ) -> Result<(), ContactError> {
        let url = self.contact_url(email, "")?;
        let body = UpsertBody {
            email,
            source,
            status: "pending",
            confirm_token,
        };

        // The upsert is idempotent upstream, so one retry on a transport
        // failure is safe. Status errors are not retried.
        match self.send_upsert(url.clone(), &body).await {
            Err(ContactError::Transport(first)) => {
                warn!(email, error = %first, "contact upsert transport failure; retrying once");
                self.send_upsert(url, &body).await
            }
            other => other,
        }
    }

    async fn mark_confirmed(&self, email: &str) -> Result<(), ContactError> {
        let url = self.contact_url(email, "/confirm")?;
        debug!(email, "marking contact confirmed");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ContactError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ContactError::Status(status.as_u16()))
        }
    }
}
