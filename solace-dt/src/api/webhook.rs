//! Inbound tracking webhook
//!
//! The provider pushes a status update whenever a carrier reports one.
//! The handler must acknowledge with HTTP 200 for every recognized case,
//! matched or not: anything else triggers provider-side retry storms for
//! payloads a retry cannot fix. The only non-200 is a signature failure
//! when a shared secret is configured.

use crate::db::deliveries;
use crate::error::{ApiError, ApiResult};
use crate::provider::normalize;
use crate::provider::types::WebhookPayload;
use crate::AppState;
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Header carrying the payload signature
const SIGN_HEADER: &str = "sign";

/// Webhook acknowledgment body
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub success: bool,
    pub message: String,
}

fn ack(message: impl Into<String>) -> Json<WebhookAck> {
    Json(WebhookAck {
        success: true,
        message: message.into(),
    })
}

/// POST /api/tracking/webhook
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    // Verify the signature before trusting anything in the body. No
    // configured secret means verification is disabled.
    if let Some(secret) = state.webhook_secret.as_deref() {
        let provided = headers.get(SIGN_HEADER).and_then(|v| v.to_str().ok());
        if let Err(e) = solace_common::api::sign::verify_signature(provided, &body, secret) {
            warn!("Rejected webhook: {}", e);
            return Err(ApiError::Unauthorized("Invalid webhook signature".to_string()));
        }
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            // The provider cannot fix a malformed payload by retrying
            warn!("Ignoring malformed webhook payload: {}", e);
            return Ok(ack("Ignored malformed payload"));
        }
    };

    debug!(
        event = payload.event.as_deref().unwrap_or("unknown"),
        number = %payload.data.number,
        "Webhook received"
    );

    let Some(track_info) = payload.data.track_info else {
        return Ok(ack("No tracking info in payload"));
    };

    let delivery = match deliveries::load_by_tracking_number(&state.db, &payload.data.number).await {
        Ok(Some(d)) => d,
        Ok(None) => {
            // Not a delivery we track; acknowledge so the provider stops
            debug!(number = %payload.data.number, "Webhook for unknown tracking number");
            return Ok(ack("Delivery not found"));
        }
        Err(e) => {
            error!(number = %payload.data.number, "Delivery lookup failed for webhook: {}", e);
            return Ok(ack("Lookup failed"));
        }
    };

    let code = track_info.latest_status.as_ref().map(|s| s.status).unwrap_or(0);
    let description = track_info
        .latest_event
        .as_ref()
        .and_then(|e| e.description.as_deref());
    let new_status = normalize::bucket_status(code, description);

    match deliveries::set_status_if_changed(&state.db, delivery.guid, new_status).await {
        Ok(true) => {
            info!(
                delivery_id = %delivery.guid,
                from = %delivery.status,
                to = %new_status,
                "Delivery status updated from webhook"
            );
            Ok(ack("Status updated"))
        }
        Ok(false) => Ok(ack("No change")),
        Err(e) => {
            // The webhook delivery itself was valid; acknowledge anyway
            error!(delivery_id = %delivery.guid, "Status write failed for webhook: {}", e);
            Ok(ack("Update failed"))
        }
    }
}

/// GET /api/tracking/webhook
///
/// Liveness payload for provider-side URL verification.
pub async fn webhook_liveness() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "module": "solace-dt",
        "endpoint": "tracking-webhook",
    }))
}
