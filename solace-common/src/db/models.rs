//! Database models

use crate::status::DeliveryStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

/// A physical shipment associated with a patient.
///
/// Timestamps are stored as RFC 3339 strings. `delivered_at` is set exactly
/// when `status` becomes `delivered`; `tracking_number`/`tracking_url` may be
/// backfilled after carrier detection succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub guid: Uuid,
    pub patient_guid: Uuid,
    pub description: String,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub status: DeliveryStatus,
    pub estimated_delivery: Option<String>,
    pub notes: Option<String>,
    pub delivered_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Family member contact for a patient; the primary contact's email is
/// passed through to the tracking provider at registration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyContact {
    pub guid: Uuid,
    pub patient_guid: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub is_primary: bool,
}
