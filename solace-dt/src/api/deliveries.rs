//! Delivery CRUD handlers
//!
//! Thin handlers over the delivery store. Create and update are the call
//! sites for best-effort tracking registration: the row write commits
//! first, then registration runs and its outcome rides along in the
//! response. A tracking failure never fails the staff action; a store
//! failure always does.

use crate::db::deliveries::{self, DeliveryUpdate};
use crate::error::{ApiError, ApiResult};
use crate::services::registration::{self, RegistrationReport, RegistrationRequest};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use solace_common::db::models::Delivery;
use solace_common::DeliveryStatus;
use tracing::info;
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateDeliveryRequest {
    pub patient_id: Uuid,
    pub description: String,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub estimated_delivery: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDeliveryRequest {
    pub description: Option<String>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub status: Option<DeliveryStatus>,
    pub estimated_delivery: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeliveryResponse {
    pub delivery: Delivery,
    /// Outcome of the best-effort tracking registration, when one ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking: Option<RegistrationReport>,
}

#[derive(Debug, Serialize)]
pub struct DeliveryListResponse {
    pub deliveries: Vec<Delivery>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/deliveries
pub async fn create_delivery(
    State(state): State<AppState>,
    Json(req): Json<CreateDeliveryRequest>,
) -> ApiResult<(StatusCode, Json<DeliveryResponse>)> {
    if req.description.trim().is_empty() {
        return Err(ApiError::BadRequest("Description must not be empty".to_string()));
    }

    let mut delivery = deliveries::new_delivery(req.patient_id, req.description.trim().to_string());
    delivery.carrier = req.carrier.clone();
    delivery.tracking_number = req.tracking_number.clone();
    delivery.tracking_url = req.tracking_url.clone();
    delivery.estimated_delivery = req.estimated_delivery.clone();
    delivery.notes = req.notes.clone();

    deliveries::insert_delivery(&state.db, &delivery)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to create delivery: {}", e)))?;

    info!(delivery_id = %delivery.guid, patient_id = %req.patient_id, "Delivery created");

    // Row is committed; registration is best-effort from here on
    let tracking = if req.tracking_url.is_some() || req.tracking_number.is_some() {
        let reg = RegistrationRequest {
            tracking_url: req.tracking_url,
            tracking_number: req.tracking_number,
            carrier: req.carrier,
            ..Default::default()
        };
        Some(registration::register_delivery(&state.db, &state.provider, delivery.guid, &reg).await)
    } else {
        None
    };

    // Reload to pick up any backfilled tracking fields
    let delivery = deliveries::load_delivery(&state.db, delivery.guid)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::Internal("Delivery vanished after insert".to_string()))?;

    Ok((StatusCode::CREATED, Json(DeliveryResponse { delivery, tracking })))
}

/// GET /api/deliveries
pub async fn list_deliveries(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<DeliveryListResponse>> {
    let deliveries = deliveries::list_deliveries(&state.db, query.patient_id)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to list deliveries: {}", e)))?;
    Ok(Json(DeliveryListResponse { deliveries }))
}

/// GET /api/deliveries/:id
pub async fn get_delivery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Delivery>> {
    let delivery = deliveries::load_delivery(&state.db, id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Delivery {} not found", id)))?;
    Ok(Json(delivery))
}

/// PUT /api/deliveries/:id
pub async fn update_delivery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDeliveryRequest>,
) -> ApiResult<Json<DeliveryResponse>> {
    let existing = deliveries::load_delivery(&state.db, id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Delivery {} not found", id)))?;

    // A re-pointed tracking number leaves a stale provider subscription
    // behind; drop it before the row changes
    if registration::needs_deregistration(
        existing.tracking_number.as_deref(),
        req.tracking_number.as_deref(),
    ) {
        registration::deregister_previous(
            &state.provider,
            id,
            existing.tracking_number.as_deref().unwrap_or_default(),
            existing.carrier.as_deref(),
        )
        .await;
    }

    let update = DeliveryUpdate {
        description: req.description.clone(),
        carrier: req.carrier.clone(),
        tracking_number: req.tracking_number.clone(),
        tracking_url: req.tracking_url.clone(),
        status: req.status,
        estimated_delivery: req.estimated_delivery.clone(),
        notes: req.notes.clone(),
    };
    let found = deliveries::update_delivery(&state.db, id, &update)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to update delivery: {}", e)))?;
    if !found {
        return Err(ApiError::NotFound(format!("Delivery {} not found", id)));
    }

    let tracking = if req.tracking_url.is_some() || req.tracking_number.is_some() {
        let reg = RegistrationRequest {
            tracking_url: req.tracking_url,
            tracking_number: req.tracking_number,
            carrier: req.carrier,
            ..Default::default()
        };
        Some(registration::register_delivery(&state.db, &state.provider, id, &reg).await)
    } else {
        None
    };

    let delivery = deliveries::load_delivery(&state.db, id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Delivery {} not found", id)))?;

    Ok(Json(DeliveryResponse { delivery, tracking }))
}

/// DELETE /api/deliveries/:id
pub async fn delete_delivery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    let existing = deliveries::load_delivery(&state.db, id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Delivery {} not found", id)))?;

    if let Some(number) = existing.tracking_number.as_deref() {
        registration::deregister_previous(&state.provider, id, number, existing.carrier.as_deref())
            .await;
    }

    let deleted = deliveries::delete_delivery(&state.db, id)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to delete delivery: {}", e)))?;
    if !deleted {
        return Err(ApiError::NotFound(format!("Delivery {} not found", id)));
    }

    info!(delivery_id = %id, "Delivery deleted");

    Ok(Json(DeleteResponse { success: true }))
}
