//! Status normalization
//!
//! Pure mapping from the provider's status vocabulary (numeric codes plus
//! free-text event descriptions) onto the canonical delivery lifecycle.
//! No side effects: given a parsed payload the same snapshot always comes
//! out, which keeps the mapping independently testable.
//!
//! Numeric buckets:
//! - 40, 50        → delivered
//! - 35            → out_for_delivery
//! - 10..35        → in_transit (30 "picked up" keeps its own display label)
//! - 0 / anything else → ordered (label created)
//!
//! The latest event's free text overrides the numeric bucket when they
//! disagree; the text is the fresher signal.

use crate::provider::types::{TrackEvent, TrackPayload};
use serde::Serialize;
use solace_common::DeliveryStatus;

/// Maximum number of granular tracking events returned for a timeline
pub const MAX_TIMELINE_EVENTS: usize = 10;

/// Default 5-step milestone sequence used when no granular events exist
const MILESTONES: [&str; 5] = [
    "Label Created",
    "We Have Your Package",
    "On the Way",
    "Out for Delivery",
    "Delivered",
];

/// One step of a family-facing tracking timeline
#[derive(Debug, Clone, Serialize)]
pub struct TimelineStep {
    pub status: String,
    pub location: Option<String>,
    pub timestamp: Option<String>,
    pub completed: bool,
}

/// Normalized view of a tracking payload
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Canonical bucket to persist on the delivery
    pub status: DeliveryStatus,
    /// Human-readable current-status label
    pub current_status: String,
    /// Estimated delivery display string, if the provider supplied one
    pub estimated_delivery: Option<String>,
    /// Up to [`MAX_TIMELINE_EVENTS`] chronological events, or synthesized
    /// milestones when the provider returned none
    pub events: Vec<TimelineStep>,
}

/// Map a numeric status code plus latest event text to the canonical bucket
pub fn bucket_status(code: i64, latest_description: Option<&str>) -> DeliveryStatus {
    let mut status = match code {
        40 | 50 => DeliveryStatus::Delivered,
        35 => DeliveryStatus::OutForDelivery,
        10..=34 => DeliveryStatus::InTransit,
        _ => DeliveryStatus::Ordered,
    };

    // Free text is more current than the coarse code when they disagree
    if let Some(desc) = latest_description {
        let lower = desc.to_ascii_lowercase();
        if lower.contains("delivered") {
            status = DeliveryStatus::Delivered;
        } else if lower.contains("out for delivery") {
            status = DeliveryStatus::OutForDelivery;
        } else if lower.contains("in transit") || lower.contains("departed") || lower.contains("arrived") {
            status = DeliveryStatus::InTransit;
        }
    }

    status
}

/// Display label for a derived status
///
/// Code 30 ("picked up") stays in the in_transit bucket but reads as
/// "We Have Your Package" rather than "On the Way".
fn display_label(status: DeliveryStatus, code: i64) -> &'static str {
    if status == DeliveryStatus::InTransit && code == 30 {
        return DeliveryStatus::Shipped.label();
    }
    status.label()
}

/// Build a normalized snapshot from a parsed provider payload
pub fn snapshot_from_payload(payload: &TrackPayload) -> Snapshot {
    let code = payload.status_code();
    let description = payload.latest_description();
    let status = bucket_status(code, description.as_deref());

    let provider_events = payload.events();
    let events = if provider_events.is_empty() {
        synthesize_milestones(status)
    } else {
        timeline_from_events(&provider_events)
    };

    Snapshot {
        status,
        current_status: display_label(status, code).to_string(),
        estimated_delivery: payload.estimated_delivery(),
        events,
    }
}

/// Build a snapshot purely from stored delivery fields (fallback path when
/// no live provider data is available)
pub fn snapshot_from_stored(status: DeliveryStatus, estimated_delivery: Option<String>) -> Snapshot {
    Snapshot {
        status,
        current_status: status.label().to_string(),
        estimated_delivery,
        events: synthesize_milestones(status),
    }
}

/// Convert granular provider events into timeline steps (chronological,
/// capped at [`MAX_TIMELINE_EVENTS`])
fn timeline_from_events(events: &[TrackEvent]) -> Vec<TimelineStep> {
    let mut steps: Vec<TimelineStep> = events
        .iter()
        .take(MAX_TIMELINE_EVENTS)
        .map(|e| TimelineStep {
            status: e.description.clone().unwrap_or_else(|| "Update".to_string()),
            location: e.location.clone(),
            timestamp: e.time_iso.clone(),
            completed: true,
        })
        .collect();
    // Providers report most recent first; families read oldest first
    steps.reverse();
    steps
}

/// Synthesize the default 5-step milestone list with completion flags
/// derived from the canonical status
pub fn synthesize_milestones(status: DeliveryStatus) -> Vec<TimelineStep> {
    let reached = status.milestone_index();
    MILESTONES
        .iter()
        .enumerate()
        .map(|(i, label)| TimelineStep {
            status: (*label).to_string(),
            location: None,
            timestamp: None,
            completed: i <= reached,
        })
        .collect()
}
