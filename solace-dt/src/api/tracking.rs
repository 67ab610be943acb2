//! Tracking endpoints: on-demand refresh, registration, batch re-registration

use crate::services::refresh::{self, TrackingStatusResponse};
use crate::services::registration::{self, BatchReport, RegistrationReport, RegistrationRequest};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RegisterTrackingRequest {
    pub delivery_id: Uuid,
    pub tracking_url: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub order_no: Option<String>,
    pub order_time: Option<String>,
    pub note: Option<String>,
}

/// GET /api/tracking/:id
///
/// On-demand status refresh. Never fails: when live tracking is
/// unavailable the response carries the stored status plus an explanatory
/// note in `error`.
pub async fn get_tracking_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<TrackingStatusResponse> {
    Json(refresh::refresh_delivery(&state.db, &state.provider, id).await)
}

/// POST /api/tracking/register
///
/// Explicit registration of a tracking number for an existing delivery.
/// The outcome is a soft report, not an HTTP error.
pub async fn register_tracking(
    State(state): State<AppState>,
    Json(req): Json<RegisterTrackingRequest>,
) -> Json<RegistrationReport> {
    let reg = RegistrationRequest {
        tracking_url: req.tracking_url,
        tracking_number: req.tracking_number,
        carrier: req.carrier,
        order_no: req.order_no,
        order_time: req.order_time,
        note: req.note,
    };
    Json(registration::register_delivery(&state.db, &state.provider, req.delivery_id, &reg).await)
}

/// POST /api/tracking/reregister-all
///
/// Re-register every undelivered delivery that has a tracking URL
/// (recovery path after provider-side subscription loss). Sequential with
/// fixed pacing; returns aggregate counts.
pub async fn reregister_all(State(state): State<AppState>) -> Json<BatchReport> {
    Json(registration::reregister_active(&state.db, &state.provider).await)
}
