//! Tracking provider wire types
//!
//! The provider has shipped two response shapes for track information: the
//! current format (`data.accepted[].track_info`) and a legacy compact form
//! (`data[].track` with single-letter field names). `TrackPayload` models
//! both as a tagged union with an explicit fallback order so a third shape
//! later is a localized change.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rejection error code meaning the number is already registered; treated
/// as success by callers.
pub const ERR_ALREADY_REGISTERED: i64 = -18019901;

// ============================================================================
// Registration
// ============================================================================

/// Single item of a registration request (sent as a one-element JSON array)
#[derive(Debug, Clone, Serialize)]
pub struct RegisterItem {
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<i64>,
    /// Correlation tag: the local delivery id
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Item echoed back in a response `accepted` list
#[derive(Debug, Clone, Deserialize)]
pub struct AcceptedItem {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub carrier: Option<i64>,
    #[serde(default)]
    pub track_info: Option<TrackInfo>,
}

/// Item echoed back in a response `rejected` list
#[derive(Debug, Clone, Deserialize)]
pub struct RejectedItem {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub error: Option<RejectionError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectionError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Generic provider response envelope: `{ code, data: {...} }`
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEnvelope {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub data: Value,
}

impl ProviderEnvelope {
    /// Accepted items, empty when absent
    pub fn accepted(&self) -> Vec<AcceptedItem> {
        self.data
            .get("accepted")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    /// Rejected items, empty when absent
    pub fn rejected(&self) -> Vec<RejectedItem> {
        self.data
            .get("rejected")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }
}

// ============================================================================
// Track information (current format)
// ============================================================================

/// Track information in the provider's current response format
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackInfo {
    #[serde(default)]
    pub latest_status: Option<LatestStatus>,
    #[serde(default)]
    pub latest_event: Option<TrackEvent>,
    #[serde(default)]
    pub estimated_delivery: Option<String>,
    #[serde(default)]
    pub events: Vec<TrackEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatestStatus {
    #[serde(default)]
    pub status: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackEvent {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub time_iso: Option<String>,
}

// ============================================================================
// Track information (legacy compact format)
// ============================================================================

/// Legacy `data[0].track` shape with single-letter field names
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyTrack {
    /// Numeric package status code
    #[serde(default, rename = "e")]
    pub status_code: i64,
    /// Tracking events, most recent first
    #[serde(default, rename = "z1")]
    pub events: Vec<LegacyEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyEvent {
    /// Event time
    #[serde(default, rename = "a")]
    pub time: Option<String>,
    /// Event location
    #[serde(default, rename = "c")]
    pub location: Option<String>,
    /// Event description
    #[serde(default, rename = "z")]
    pub description: Option<String>,
}

// ============================================================================
// Tagged union over both formats
// ============================================================================

/// Parsed track information from either provider response generation
#[derive(Debug, Clone)]
pub enum TrackPayload {
    /// Current format: `data.accepted[0].track_info`
    Current(TrackInfo),
    /// Legacy format: `data[0].track`
    Legacy(LegacyTrack),
}

impl TrackPayload {
    /// Parse a raw get-tracking-info response body.
    ///
    /// Fallback order is explicit: the current `accepted` shape is tried
    /// first, then the legacy `track` array.
    pub fn from_response(body: &Value) -> Option<TrackPayload> {
        // Current format: data.accepted[0].track_info
        if let Some(accepted) = body.pointer("/data/accepted/0/track_info") {
            if let Ok(info) = serde_json::from_value::<TrackInfo>(accepted.clone()) {
                return Some(TrackPayload::Current(info));
            }
        }

        // Legacy format: data[0].track
        if let Some(track) = body.pointer("/data/0/track") {
            if let Ok(track) = serde_json::from_value::<LegacyTrack>(track.clone()) {
                return Some(TrackPayload::Legacy(track));
            }
        }

        None
    }

    /// Numeric status code (0 when the payload carries none)
    pub fn status_code(&self) -> i64 {
        match self {
            TrackPayload::Current(info) => {
                info.latest_status.as_ref().map(|s| s.status).unwrap_or(0)
            }
            TrackPayload::Legacy(track) => track.status_code,
        }
    }

    /// Latest event description, if any
    pub fn latest_description(&self) -> Option<String> {
        match self {
            TrackPayload::Current(info) => info
                .latest_event
                .as_ref()
                .and_then(|e| e.description.clone()),
            TrackPayload::Legacy(track) => {
                track.events.first().and_then(|e| e.description.clone())
            }
        }
    }

    /// Estimated delivery display string, if the provider supplied one
    pub fn estimated_delivery(&self) -> Option<String> {
        match self {
            TrackPayload::Current(info) => info.estimated_delivery.clone(),
            TrackPayload::Legacy(_) => None,
        }
    }

    /// Tracking events normalized to the current-format event shape
    pub fn events(&self) -> Vec<TrackEvent> {
        match self {
            TrackPayload::Current(info) => info.events.clone(),
            TrackPayload::Legacy(track) => track
                .events
                .iter()
                .map(|e| TrackEvent {
                    description: e.description.clone(),
                    location: e.location.clone(),
                    time_iso: e.time.clone(),
                })
                .collect(),
        }
    }
}

// ============================================================================
// Inbound webhook payload
// ============================================================================

/// Webhook push notification body
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub event: Option<String>,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub number: String,
    #[serde(default)]
    pub track_info: Option<TrackInfo>,
}
