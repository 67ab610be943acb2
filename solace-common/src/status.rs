//! Canonical delivery status lifecycle
//!
//! Every stored delivery carries exactly one of these states. External
//! carrier vocabularies (numeric codes, free-text events) are mapped onto
//! this enum by the tracking service; family-facing views only ever read
//! the stored canonical value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical delivery status stored on a delivery record.
///
/// Transitions are monotonic in practice (ordered → shipped → in_transit →
/// out_for_delivery → delivered) but not enforced by a state machine: staff
/// edits and carrier updates may write any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Order recorded, label created, nothing picked up yet
    Ordered,
    /// Carrier has the package
    Shipped,
    /// Moving through the carrier network
    InTransit,
    /// On a vehicle for final delivery
    OutForDelivery,
    /// Delivered to the family
    Delivered,
    /// Carrier reported a problem (address issue, damage, return)
    Exception,
}

impl DeliveryStatus {
    /// Database/string form (snake_case, matches serde representation)
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Ordered => "ordered",
            DeliveryStatus::Shipped => "shipped",
            DeliveryStatus::InTransit => "in_transit",
            DeliveryStatus::OutForDelivery => "out_for_delivery",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Exception => "exception",
        }
    }

    /// Human-readable label shown in family-facing timelines
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryStatus::Ordered => "Label Created",
            DeliveryStatus::Shipped => "We Have Your Package",
            DeliveryStatus::InTransit => "On the Way",
            DeliveryStatus::OutForDelivery => "Out for Delivery",
            DeliveryStatus::Delivered => "Delivered",
            DeliveryStatus::Exception => "Delivery Exception",
        }
    }

    /// Parse a stored status string, falling back to `Ordered` for anything
    /// unrecognized. Rows predate the current vocabulary occasionally; a
    /// lossy read keeps list views working.
    pub fn parse_lossy(s: &str) -> Self {
        s.parse().unwrap_or(DeliveryStatus::Ordered)
    }

    /// Position in the 5-step milestone sequence (exception maps alongside
    /// in_transit for timeline rendering purposes).
    pub fn milestone_index(&self) -> usize {
        match self {
            DeliveryStatus::Ordered => 0,
            DeliveryStatus::Shipped => 1,
            DeliveryStatus::InTransit | DeliveryStatus::Exception => 2,
            DeliveryStatus::OutForDelivery => 3,
            DeliveryStatus::Delivered => 4,
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ordered" => Ok(DeliveryStatus::Ordered),
            "shipped" => Ok(DeliveryStatus::Shipped),
            "in_transit" => Ok(DeliveryStatus::InTransit),
            "out_for_delivery" => Ok(DeliveryStatus::OutForDelivery),
            "delivered" => Ok(DeliveryStatus::Delivered),
            "exception" => Ok(DeliveryStatus::Exception),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown delivery status: {}",
                other
            ))),
        }
    }
}
