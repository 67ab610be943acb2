//! On-demand tracking refresh
//!
//! Pull-based status check used when no webhook has arrived yet, or when
//! an admin explicitly asks for fresh data. Never errors: when the
//! provider is unreachable or unconfigured the response is built from the
//! stored delivery row with an explanatory note, and the worst case is a
//! "Label Created" skeleton.

use crate::carriers;
use crate::db::deliveries::{self, DeliveryUpdate};
use crate::provider::client::{FetchOutcome, ProviderClient};
use crate::provider::normalize::{self, Snapshot, TimelineStep};
use serde::Serialize;
use solace_common::DeliveryStatus;
use sqlx::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

/// Note attached when live tracking cannot run without provider credentials
const NOT_CONFIGURED_NOTE: &str =
    "Live tracking requires API configuration; showing last stored status";

/// Family/admin-facing tracking status payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStatusResponse {
    pub success: bool,
    pub delivery_id: Uuid,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub current_status: String,
    pub canonical_status: DeliveryStatus,
    pub estimated_delivery: Option<String>,
    pub events: Vec<TimelineStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Refresh a delivery's tracking status.
///
/// Provider data wins when available and is persisted through the same
/// conditional write the webhook path uses; otherwise the stored row is
/// returned with a note explaining why live data is missing.
pub async fn refresh_delivery(
    db: &SqlitePool,
    provider: &ProviderClient,
    delivery_id: Uuid,
) -> TrackingStatusResponse {
    let delivery = match deliveries::load_delivery(db, delivery_id).await {
        Ok(Some(d)) => d,
        Ok(None) => {
            debug!(delivery_id = %delivery_id, "Refresh requested for unknown delivery");
            return skeleton(delivery_id, "Delivery not found");
        }
        Err(e) => {
            warn!(delivery_id = %delivery_id, "Delivery lookup failed during refresh: {}", e);
            return skeleton(delivery_id, "Delivery lookup failed");
        }
    };

    let Some(tracking_number) = delivery.tracking_number.clone() else {
        let snapshot =
            normalize::snapshot_from_stored(delivery.status, delivery.estimated_delivery.clone());
        return from_snapshot(
            &delivery,
            snapshot,
            Some("No tracking number on file; showing last stored status".to_string()),
        );
    };

    let carrier_code = delivery
        .carrier
        .as_deref()
        .and_then(carriers::by_name)
        .map(|c| c.code);

    match provider.get_track_info(&tracking_number, carrier_code).await {
        FetchOutcome::Fetched(payload) => {
            let snapshot = normalize::snapshot_from_payload(&payload);

            // Deliberate refresh: persist the derived status through the
            // same conditional write the webhook uses
            if let Err(e) = deliveries::set_status_if_changed(db, delivery.guid, snapshot.status).await
            {
                warn!(delivery_id = %delivery.guid, "Status write failed during refresh: {}", e);
            }
            if let Some(eta) = snapshot.estimated_delivery.clone() {
                let update = DeliveryUpdate {
                    estimated_delivery: Some(eta),
                    ..Default::default()
                };
                if let Err(e) = deliveries::update_delivery(db, delivery.guid, &update).await {
                    warn!(delivery_id = %delivery.guid, "Estimated-delivery write failed: {}", e);
                }
            }

            from_snapshot(&delivery, snapshot, None)
        }
        FetchOutcome::NotConfigured => {
            let snapshot = normalize::snapshot_from_stored(
                delivery.status,
                delivery.estimated_delivery.clone(),
            );
            from_snapshot(&delivery, snapshot, Some(NOT_CONFIGURED_NOTE.to_string()))
        }
        FetchOutcome::Failed { message } => {
            warn!(delivery_id = %delivery.guid, "Live tracking fetch failed: {}", message);
            let snapshot = normalize::snapshot_from_stored(
                delivery.status,
                delivery.estimated_delivery.clone(),
            );
            from_snapshot(
                &delivery,
                snapshot,
                Some(format!("Live tracking temporarily unavailable: {}", message)),
            )
        }
    }
}

fn from_snapshot(
    delivery: &solace_common::db::models::Delivery,
    snapshot: Snapshot,
    error: Option<String>,
) -> TrackingStatusResponse {
    TrackingStatusResponse {
        success: true,
        delivery_id: delivery.guid,
        tracking_number: delivery.tracking_number.clone(),
        carrier: delivery.carrier.clone(),
        current_status: snapshot.current_status,
        canonical_status: snapshot.status,
        estimated_delivery: snapshot.estimated_delivery,
        events: snapshot.events,
        error,
    }
}

fn skeleton(delivery_id: Uuid, note: &str) -> TrackingStatusResponse {
    let snapshot = normalize::snapshot_from_stored(DeliveryStatus::Ordered, None);
    TrackingStatusResponse {
        success: true,
        delivery_id,
        tracking_number: None,
        carrier: None,
        current_status: snapshot.current_status,
        canonical_status: snapshot.status,
        estimated_delivery: None,
        events: snapshot.events,
        error: Some(note.to_string()),
    }
}
