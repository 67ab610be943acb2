//! solace-dt library - Delivery Tracking module
//!
//! Package-delivery tracking for the Solace family portal: delivery
//! records, carrier detection, tracking-provider registration, webhook
//! reconciliation, and on-demand status refresh. Family-facing views only
//! ever read the stored delivery row; all provider traffic happens here.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::provider::client::ProviderClient;

pub mod api;
pub mod carriers;
pub mod config;
pub mod db;
pub mod error;
pub mod provider;
pub mod services;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Tracking provider client (degrades gracefully when unconfigured)
    pub provider: Arc<ProviderClient>,
    /// Shared secret for inbound webhook signatures; None disables
    /// verification
    pub webhook_secret: Option<String>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, provider: ProviderClient, webhook_secret: Option<String>) -> Self {
        Self {
            db,
            provider: Arc::new(provider),
            webhook_secret,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/api/deliveries", post(api::create_delivery).get(api::list_deliveries))
        .route(
            "/api/deliveries/:id",
            get(api::get_delivery)
                .put(api::update_delivery)
                .delete(api::delete_delivery),
        )
        .route("/api/tracking/register", post(api::register_tracking))
        .route("/api/tracking/reregister-all", post(api::reregister_all))
        .route("/api/tracking/webhook", post(api::receive_webhook).get(api::webhook_liveness))
        .route("/api/tracking/:id", get(api::get_tracking_status))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
