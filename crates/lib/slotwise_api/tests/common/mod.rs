//! Shared test fixtures: fake boundaries and a deterministic `AppState`.

// Not every test binary uses every fixture.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use chrono::{TimeZone, Utc};
use url::Url;

use slotwise_api::{AppState, config::ApiConfig};
use slotwise_core::busy::BusySource;
use slotwise_core::clock::ManualClock;
use slotwise_core::contacts::{ContactError, ContactStore};
use slotwise_core::verify::{DomainVerifier, VerifyError};

/// Contact store that records calls instead of talking to a CRM.
#[derive(Default)]
pub struct RecordingContactStore {
    pub upserts: Mutex<Vec<(String, String, String)>>,
    pub confirmed: Mutex<Vec<String>>,
}

#[async_trait]
impl ContactStore for RecordingContactStore {
    async fn upsert_pending(
        &self,
        email: &str,
        source: &str,
        confirm_token: &str,
    ) -> Result<(), ContactError> {
        self.upserts.lock().unwrap().push((
            email.to_string(),
            source.to_string(),
            confirm_token.to_string(),
        ));
        Ok(())
    }

    async fn mark_confirmed(&self, email: &str) -> Result<(), ContactError> {
        self.confirmed.lock().unwrap().push(email.to_string());
        Ok(())
    }
}

/// Verifier with a fixed verdict.
pub struct FixedVerifier(pub bool);

#[async_trait]
impl DomainVerifier for FixedVerifier {
    async fn has_mail_exchanger(&self, _domain: &str) -> Result<bool, VerifyError> {
        Ok(self.0)
    }
}

pub fn test_config() -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        service_tz: chrono_tz::Europe::Berlin,
        slot_duration_min: 30,
        rate_window_secs: 60,
        rate_max_per_window: 1,
        token_ttl_hours: 48,
        feed_urls: Vec::new(),
        feed_cache_ttl_secs: 0,
        contact_api_url: Url::parse("http://127.0.0.1:4010/").unwrap(),
        contact_api_key: String::new(),
        confirm_ok_url: "/subscribe/confirmed".into(),
        confirm_invalid_url: "/subscribe/invalid".into(),
        verify_mx: true,
    }
}

pub fn test_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        // A Monday.
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap(),
    ))
}

pub struct TestHarness {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub contacts: Arc<RecordingContactStore>,
}

pub fn harness(
    config: ApiConfig,
    busy: Arc<dyn BusySource>,
    verifier: Arc<dyn DomainVerifier>,
) -> TestHarness {
    let clock = test_clock();
    let contacts = Arc::new(RecordingContactStore::default());
    let state = AppState::new(
        config,
        clock.clone(),
        busy,
        contacts.clone(),
        verifier,
    );
    TestHarness {
        state,
        clock,
        contacts,
    }
}

/// JSON POST with the connect-info extension the router expects in
/// production.
pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .extension(ConnectInfo::<SocketAddr>("10.0.0.9:55555".parse().unwrap()))
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// POST with an arbitrary body, for malformed-payload cases.
pub fn post_raw(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .extension(ConnectInfo::<SocketAddr>("10.0.0.9:55555".parse().unwrap()))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .extension(ConnectInfo::<SocketAddr>("10.0.0.9:55555".parse().unwrap()))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}
