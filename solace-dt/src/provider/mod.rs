//! External multi-carrier tracking provider integration
//!
//! The provider performs the actual carrier polling and pushes status
//! changes back to us over a webhook. This module owns the outbound side:
//! wire types for both response generations the provider has shipped,
//! the pure status-normalization mapping, and the HTTP client used for
//! registration, deregistration, and on-demand status fetches.

pub mod client;
pub mod normalize;
pub mod types;

pub use client::{FetchOutcome, ProviderClient, RegisterOutcome, StopOutcome};
pub use normalize::{snapshot_from_payload, snapshot_from_stored, Snapshot, TimelineStep};
pub use types::{TrackInfo, TrackPayload, WebhookData, WebhookPayload};
