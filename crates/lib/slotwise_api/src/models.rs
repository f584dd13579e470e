//! Wire models for the HTTP API (camelCase JSON).

use serde::{Deserialize, Serialize};

/// Generic error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// One bookable slot, RFC 3339 bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotModel {
    pub start: String,
    pub end: String,
}

/// `GET /api/availability` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub slots: Vec<SlotModel>,
    pub slot_duration_min: u32,
}

/// `GET /api/availability` query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityParams {
    /// RFC 3339 window start; defaults to the beginning of the current day.
    pub start: Option<String>,
    /// RFC 3339 window end; defaults to fourteen days out, end of day.
    pub end: Option<String>,
}

/// `POST /api/subscribe` request body.
///
/// `website` is the honeypot field: hidden in the real form, so any
/// non-empty value marks an automated submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// `POST /api/subscribe` success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeResponse {
    pub ok: bool,
    pub email: String,
}

/// `GET /api/confirm` query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmParams {
    #[serde(default)]
    pub token: Option<String>,
}

/// `GET /api/health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub feeds_configured: bool,
}
