//! Availability query handler.

use axum::Json;
use axum::extract::{Query, State};
use chrono::{DateTime, Utc};

use slotwise_core::availability::{compute_slots, resolve_window};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{AvailabilityParams, AvailabilityResponse, SlotModel};

/// `GET /api/availability` — bookable slots inside the queried horizon.
///
/// Window bounds are optional; defaults and clamping follow the service
/// zone. An unconfigured busy source is a 503, never a misleading 200.
pub async fn availability_handler(
    State(state): State<AppState>,
    Query(params): Query<AvailabilityParams>,
) -> AppResult<Json<AvailabilityResponse>> {
    let start = parse_bound("start", params.start.as_deref())?;
    let end = parse_bound("end", params.end.as_deref())?;

    let window = resolve_window(start, end, state.config.service_tz, state.clock.now());
    let calendars = state.busy.fetch(window).await?;
    let schedule = compute_slots(window, &calendars, state.config.slot_duration_min);

    Ok(Json(AvailabilityResponse {
        slots: schedule
            .slots
            .iter()
            .map(|s| SlotModel {
                start: s.start.to_rfc3339(),
                end: s.end.to_rfc3339(),
            })
            .collect(),
        slot_duration_min: schedule.slot_duration_min,
    }))
}

fn parse_bound(name: &str, raw: Option<&str>) -> AppResult<Option<DateTime<Utc>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|_| AppError::Validation(format!("'{name}' is not a valid RFC 3339 timestamp")))
}
