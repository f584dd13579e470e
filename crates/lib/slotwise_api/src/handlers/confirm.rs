//! Confirm-link handler.

use axum::extract::{Query, State};
use axum::response::Redirect;
use tracing::{info, warn};

use crate::AppState;
use crate::models::ConfirmParams;

/// `GET /api/confirm?token=` — consume a confirmation token and mark the
/// contact confirmed.
///
/// Reached from a clicked email link, so every outcome is a redirect:
/// token hits go to the "ok" page, everything else (missing, unknown,
/// expired, replayed, upstream failure after consume) to the "invalid"
/// page. Never a JSON error body. The consume is single-shot by design
/// and is not retried against the upstream.
pub async fn confirm_handler(
    State(state): State<AppState>,
    Query(params): Query<ConfirmParams>,
) -> Redirect {
    let invalid = Redirect::to(&state.config.confirm_invalid_url);

    let Some(token) = params.token.filter(|t| !t.is_empty()) else {
        return invalid;
    };

    let Some(email) = state.tokens.consume(&token) else {
        info!("confirm token not found or expired");
        return invalid;
    };

    match state.contacts.mark_confirmed(&email).await {
        Ok(()) => {
            info!(email, "contact confirmed");
            Redirect::to(&state.config.confirm_ok_url)
        }
        Err(e) => {
            warn!(email, error = %e, "confirm upsert failed after token consume");
            invalid
        }
    }
}
