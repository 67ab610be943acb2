//! Tracking registration flow
//!
//! Registration is always best-effort: the delivery row is the primary
//! record and must already be committed before any of this runs. Whatever
//! the provider says (or fails to say), the caller's create/update
//! succeeds; the outcome is reported back as a soft result.

use crate::carriers;
use crate::db::{contacts, deliveries};
use crate::provider::client::{ProviderClient, RegisterOutcome, StopOutcome};
use crate::provider::types::RegisterItem;
use serde::Serialize;
use sqlx::SqlitePool;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Fixed pause between successive registrations in the batch path
/// (rate-limit courtesy to the provider)
const BATCH_PACING: Duration = Duration::from_millis(500);

/// Inputs to a registration attempt; unspecified fields fall back to the
/// stored delivery row.
#[derive(Debug, Clone, Default)]
pub struct RegistrationRequest {
    pub tracking_url: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub order_no: Option<String>,
    pub order_time: Option<String>,
    pub note: Option<String>,
}

/// Soft result of a registration attempt
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationReport {
    pub success: bool,
    /// Whether the provider is now tracking the number (true for
    /// already-registered too)
    pub registered: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
}

impl RegistrationReport {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            registered: false,
            message: message.into(),
            tracking_number: None,
            carrier: None,
        }
    }
}

/// Aggregate result of the batch re-registration pass
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<String>,
}

/// Whether an edited tracking number re-points the delivery away from a
/// previously registered subscription
pub fn needs_deregistration(stored: Option<&str>, incoming: Option<&str>) -> bool {
    match (stored, incoming) {
        (Some(old), Some(new)) => !old.is_empty() && old != new,
        _ => false,
    }
}

/// Register a delivery's tracking number with the provider and backfill
/// detected tracking fields onto the row.
pub async fn register_delivery(
    db: &SqlitePool,
    provider: &ProviderClient,
    delivery_id: Uuid,
    req: &RegistrationRequest,
) -> RegistrationReport {
    let delivery = match deliveries::load_delivery(db, delivery_id).await {
        Ok(Some(d)) => d,
        Ok(None) => return RegistrationReport::failure("Delivery not found"),
        Err(e) => {
            warn!(delivery_id = %delivery_id, "Delivery lookup failed: {}", e);
            return RegistrationReport::failure(format!("Delivery lookup failed: {}", e));
        }
    };

    let tracking_url = req
        .tracking_url
        .clone()
        .or_else(|| delivery.tracking_url.clone());

    // Resolve a bare tracking number: explicit input first, then extraction
    // from whichever URL we have, then whatever is already stored.
    let tracking_number = req
        .tracking_number
        .clone()
        .filter(|n| !n.trim().is_empty())
        .or_else(|| tracking_url.as_deref().and_then(carriers::extract_tracking_number))
        .or_else(|| delivery.tracking_number.clone());

    let Some(tracking_number) = tracking_number else {
        debug!(delivery_id = %delivery_id, "No tracking number available for registration");
        return RegistrationReport::failure("No tracking number available");
    };

    let detected = req
        .carrier
        .as_deref()
        .and_then(carriers::by_name)
        .or_else(|| carriers::detect(tracking_url.as_deref(), Some(tracking_number.as_str())));
    let mut carrier_name = detected.map(|c| c.name.to_string()).or_else(|| delivery.carrier.clone());
    let carrier_code = detected.map(|c| c.code);

    // Backfill detected fields regardless of what the provider says next
    if let Err(e) = deliveries::update_tracking_fields(
        db,
        delivery_id,
        Some(tracking_number.as_str()),
        carrier_name.as_deref(),
    )
    .await
    {
        warn!(delivery_id = %delivery_id, "Tracking field backfill failed: {}", e);
    }

    let email = match contacts::primary_contact_email(db, delivery.patient_guid).await {
        Ok(email) => email,
        Err(e) => {
            warn!(delivery_id = %delivery_id, "Contact lookup failed: {}", e);
            None
        }
    };

    let item = RegisterItem {
        number: tracking_number.clone(),
        carrier: carrier_code,
        tag: delivery_id.to_string(),
        email,
        order_no: req.order_no.clone(),
        order_time: req.order_time.clone(),
        note: req.note.clone(),
    };

    match provider.register(&item).await {
        RegisterOutcome::Registered { carrier } => {
            // The provider may auto-detect a carrier we could not
            if carrier_name.is_none() {
                if let Some(name) = carrier
                    .and_then(|code| carriers::CARRIERS.iter().find(|c| c.code == code))
                    .map(|c| c.name.to_string())
                {
                    if let Err(e) =
                        deliveries::update_tracking_fields(db, delivery_id, None, Some(name.as_str()))
                            .await
                    {
                        warn!(delivery_id = %delivery_id, "Carrier backfill failed: {}", e);
                    }
                    carrier_name = Some(name);
                }
            }
            info!(delivery_id = %delivery_id, number = %tracking_number, "Tracking registered");
            RegistrationReport {
                success: true,
                registered: true,
                message: "Tracking registered".to_string(),
                tracking_number: Some(tracking_number),
                carrier: carrier_name,
            }
        }
        RegisterOutcome::AlreadyRegistered => RegistrationReport {
            success: true,
            registered: true,
            message: "Tracking already registered".to_string(),
            tracking_number: Some(tracking_number),
            carrier: carrier_name,
        },
        RegisterOutcome::NotConfigured => RegistrationReport {
            success: false,
            registered: false,
            message: "Tracking provider not configured".to_string(),
            tracking_number: Some(tracking_number),
            carrier: carrier_name,
        },
        RegisterOutcome::Rejected { message } | RegisterOutcome::Failed { message } => {
            RegistrationReport {
                success: false,
                registered: false,
                message,
                tracking_number: Some(tracking_number),
                carrier: carrier_name,
            }
        }
    }
}

/// Deregister a delivery's previous tracking number after staff re-pointed
/// it at a different one. Best-effort; failures are logged and ignored.
pub async fn deregister_previous(
    provider: &ProviderClient,
    delivery_id: Uuid,
    old_number: &str,
    old_carrier: Option<&str>,
) {
    let carrier_code = old_carrier.and_then(carriers::by_name).map(|c| c.code);
    match provider.stop_track(old_number, carrier_code).await {
        StopOutcome::Stopped => {
            info!(delivery_id = %delivery_id, number = %old_number, "Deregistered stale tracking number");
        }
        StopOutcome::NotConfigured => {}
        StopOutcome::Failed { message } => {
            // Stale subscriptions can no longer match a local row; their
            // webhooks are acknowledged as no-ops.
            warn!(delivery_id = %delivery_id, number = %old_number, "Deregistration failed: {}", message);
        }
    }
}

/// Re-register every delivery that has a tracking URL and is not yet
/// delivered, pacing calls to respect provider rate limits.
pub async fn reregister_active(db: &SqlitePool, provider: &ProviderClient) -> BatchReport {
    let candidates = match deliveries::list_active_with_tracking_url(db).await {
        Ok(list) => list,
        Err(e) => {
            warn!("Batch re-registration listing failed: {}", e);
            return BatchReport {
                attempted: 0,
                succeeded: 0,
                failed: 0,
                failures: vec![format!("Listing failed: {}", e)],
            };
        }
    };

    let mut report = BatchReport {
        attempted: 0,
        succeeded: 0,
        failed: 0,
        failures: Vec::new(),
    };

    for (i, delivery) in candidates.iter().enumerate() {
        if i > 0 {
            sleep(BATCH_PACING).await;
        }

        report.attempted += 1;
        let req = RegistrationRequest {
            tracking_url: delivery.tracking_url.clone(),
            tracking_number: delivery.tracking_number.clone(),
            carrier: delivery.carrier.clone(),
            ..Default::default()
        };
        let result = register_delivery(db, provider, delivery.guid, &req).await;
        if result.registered {
            report.succeeded += 1;
        } else {
            report.failed += 1;
            report
                .failures
                .push(format!("{}: {}", delivery.guid, result.message));
        }
    }

    info!(
        attempted = report.attempted,
        succeeded = report.succeeded,
        failed = report.failed,
        "Batch re-registration complete"
    );

    report
}
