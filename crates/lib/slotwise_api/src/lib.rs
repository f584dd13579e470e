//! # slotwise_api
//!
//! HTTP API library for Slotwise.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use slotwise_core::busy::BusySource;
use slotwise_core::clock::Clock;
use slotwise_core::contacts::ContactStore;
use slotwise_core::ratelimit::RateLimiter;
use slotwise_core::token::TokenStore;
use slotwise_core::verify::DomainVerifier;

use crate::config::ApiConfig;
use crate::handlers::{availability, confirm, health, subscribe};

/// Shared application state passed to all handlers.
///
/// The stateful components (limiter, token store) are owned here and
/// share one injected clock; there are no module-level singletons.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Time source shared by every component.
    pub clock: Arc<dyn Clock>,
    /// Fixed-window limiter guarding the subscribe endpoint.
    pub limiter: Arc<RateLimiter>,
    /// Double opt-in confirmation tokens.
    pub tokens: Arc<TokenStore>,
    /// External calendar feeds.
    pub busy: Arc<dyn BusySource>,
    /// External CRM contact storage.
    pub contacts: Arc<dyn ContactStore>,
    /// Email-domain verification.
    pub verifier: Arc<dyn DomainVerifier>,
}

impl AppState {
    /// Wire up the stateful components from configuration. The limiter and
    /// token store share the injected clock.
    pub fn new(
        config: ApiConfig,
        clock: Arc<dyn Clock>,
        busy: Arc<dyn BusySource>,
        contacts: Arc<dyn ContactStore>,
        verifier: Arc<dyn DomainVerifier>,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(
            slotwise_core::ratelimit::RateLimiterConfig {
                window: chrono::Duration::seconds(config.rate_window_secs),
                max_per_window: config.rate_max_per_window,
            },
            Arc::clone(&clock),
        ));
        let tokens = Arc::new(TokenStore::new(
            slotwise_core::token::TokenStoreConfig {
                ttl: chrono::Duration::hours(config.token_ttl_hours),
            },
            Arc::clone(&clock),
        ));
        Self {
            config,
            clock,
            limiter,
            tokens,
            busy,
            contacts,
            verifier,
        }
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health::health_handler))
        .route("/api/availability", get(availability::availability_handler))
        .route("/api/subscribe", post(subscribe::subscribe_handler))
        .route("/api/confirm", get(confirm::confirm_handler))
        .layer(cors)
        .with_state(state)
}
