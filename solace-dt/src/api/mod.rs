//! HTTP API handlers for solace-dt

pub mod deliveries;
pub mod health;
pub mod tracking;
pub mod webhook;

pub use deliveries::{
    create_delivery, delete_delivery, get_delivery, list_deliveries, update_delivery,
};
pub use health::health_routes;
pub use tracking::{get_tracking_status, register_tracking, reregister_all};
pub use webhook::{receive_webhook, webhook_liveness};
