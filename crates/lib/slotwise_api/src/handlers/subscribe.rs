//! Subscribe endpoint handler.

use std::net::SocketAddr;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::AppState;
use crate::error::AppResult;
use crate::models::SubscribeResponse;
use crate::services::client_key;
use crate::services::subscribe::{SubscribeOutcome, run_subscribe};

/// `POST /api/subscribe` — rate-limited, honeypot-guarded double opt-in
/// entry point.
///
/// The body is taken as raw bytes and decoded inside the workflow, after
/// the rate limiter has run: a malformed payload spends request budget and
/// is answered with 400, not an extractor rejection.
///
/// A honeypot-triggered drop answers 204 with no body: the sender must not
/// be able to tell a filtered submission from an accepted one.
pub async fn subscribe_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let key = client_key::derive(&headers, peer);

    match run_subscribe(&state, &key, &body).await? {
        SubscribeOutcome::Accepted { email } => {
            Ok(Json(SubscribeResponse { ok: true, email }).into_response())
        }
        SubscribeOutcome::SilentlyDropped => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
