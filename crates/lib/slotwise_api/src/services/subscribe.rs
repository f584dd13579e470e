//! Subscription workflow — the ordered gate pipeline behind
//! `POST /api/subscribe`.
//!
//! Gates run strictly in order: rate limit, payload decoding and
//! validation, honeypot, domain verification, then token issuance plus the
//! idempotent contact upsert. Decoding sits behind the limiter so a
//! malformed body spends request budget like any other submission. Every
//! rejection carries its reason except the honeypot drop, which must be
//! indistinguishable from success to the sender.

use tracing::{info, warn};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::SubscribeRequest;

/// Longest RFC-plausible address we accept.
const MAX_EMAIL_LEN: usize = 254;

/// Source label recorded when the form does not send one.
const DEFAULT_SOURCE: &str = "landing";

/// Terminal states of the workflow that are not rejections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// Token issued and contact upserted pending confirmation.
    Accepted { email: String },
    /// Honeypot tripped; the caller sees an empty success.
    SilentlyDropped,
}

/// Run the gates for one subscribe request.
pub async fn run_subscribe(
    state: &AppState,
    client_key: &str,
    payload: &[u8],
) -> AppResult<SubscribeOutcome> {
    // Gate 1: rate limit. The limiter fails closed internally.
    let decision = state.limiter.allow(client_key);
    if !decision.ok {
        info!(key = client_key, "subscribe rate limited");
        return Err(AppError::RateLimited {
            retry_after_secs: decision.retry_after_secs(state.clock.now()),
        });
    }

    // Gate 2: payload decoding and validation.
    let request: SubscribeRequest = serde_json::from_slice(payload)
        .map_err(|e| AppError::Validation(format!("malformed subscribe payload: {e}")))?;
    let email = validate_email(&request.email)?;

    // Gate 3: honeypot. Accept-and-drop, no token, no upsert.
    if request
        .website
        .as_deref()
        .is_some_and(|w| !w.trim().is_empty())
    {
        info!(key = client_key, "honeypot field filled; dropping silently");
        return Ok(SubscribeOutcome::SilentlyDropped);
    }

    // Gate 4: the domain must accept mail. Lookup failures are upstream
    // errors, not an invalid-domain verdict.
    if state.config.verify_mx {
        let domain = email_domain(&email);
        match state.verifier.has_mail_exchanger(domain).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(AppError::InvalidDomain(format!(
                    "'{domain}' has no mail exchanger"
                )));
            }
            Err(e) => {
                warn!(domain, error = %e, "domain verification unavailable");
                return Err(e.into());
            }
        }
    }

    // Gate 5: issue the confirmation token, then upsert the contact. The
    // upstream send of the opt-in mail hangs off the upserted token.
    let source = request.source.as_deref().unwrap_or(DEFAULT_SOURCE);
    let token = state.tokens.issue(&email);
    state.contacts.upsert_pending(&email, source, &token).await?;

    info!(email, source, "subscription pending confirmation");
    Ok(SubscribeOutcome::Accepted { email })
}

/// Normalize and shape-check an address: trimmed, lowercased, one `@`,
/// non-empty local part, dotted domain, bounded length.
pub fn validate_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_ascii_lowercase();

    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return Err(AppError::Validation("email length out of range".into()));
    }
    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AppError::Validation("email contains whitespace".into()));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(AppError::Validation("email is missing '@'".into()));
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(AppError::Validation("email shape is invalid".into()));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(AppError::Validation("email domain is invalid".into()));
    }

    Ok(email)
}

/// The domain part of an already-validated address.
fn email_domain(email: &str) -> &str {
    email.rsplit('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_email_normalizes_case_and_whitespace() {
        assert_eq!(
            validate_email("  Ada@Example.COM ").unwrap(),
            "ada@example.com"
        );
    }

    #[test]
    fn validate_email_rejects_missing_at() {
        assert!(validate_email("ada.example.com").is_err());
    }

    #[test]
    fn validate_email_rejects_double_at() {
        assert!(validate_email("ada@x@example.com").is_err());
    }

    #[test]
    fn validate_email_rejects_undotted_domain() {
        assert!(validate_email("ada@localhost").is_err());
    }

    #[test]
    fn validate_email_rejects_edge_dots_in_domain() {
        assert!(validate_email("ada@.example.com").is_err());
        assert!(validate_email("ada@example.com.").is_err());
    }

    #[test]
    fn validate_email_rejects_overlong_input() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn email_domain_extracts_the_domain() {
        assert_eq!(email_domain("ada@example.com"), "example.com");
    }
}
