//! Registration, deregistration, and refresh flows against an in-process
//! mock tracking provider
//!
//! The mock records every call it receives, letting these tests assert on
//! the outbound wire traffic: correlation tags, notification email
//! pass-through, stop-track on re-pointed tracking numbers, and both
//! response generations of the get-tracking-info endpoint.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use solace_dt::db::deliveries::{self, new_delivery};
use solace_dt::provider::client::ProviderClient;
use solace_dt::services::refresh;
use solace_dt::services::registration::{self, RegistrationRequest};
use solace_dt::{build_router, AppState};
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;
use uuid::Uuid;

// =============================================================================
// Mock provider
// =============================================================================

#[derive(Clone, Default)]
struct MockProvider {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockProvider {
    fn calls_to(&self, endpoint: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

async fn handle_register(State(mock): State<MockProvider>, Json(body): Json<Value>) -> Json<Value> {
    mock.calls.lock().unwrap().push(("register".to_string(), body.clone()));
    let item = &body[0];
    let number = item["number"].as_str().unwrap_or_default().to_string();

    if number.starts_with("DUP") {
        return Json(json!({
            "code": 0,
            "data": {
                "accepted": [],
                "rejected": [{
                    "number": number,
                    "error": { "code": -18019901, "message": "The number is already registered" }
                }]
            }
        }));
    }
    if number.starts_with("REJ") {
        return Json(json!({
            "code": 0,
            "data": {
                "accepted": [],
                "rejected": [{
                    "number": number,
                    "error": { "code": -18010012, "message": "Invalid tracking number" }
                }]
            }
        }));
    }

    let carrier = item.get("carrier").cloned().unwrap_or(json!(100002));
    Json(json!({
        "code": 0,
        "data": {
            "accepted": [{ "number": number, "carrier": carrier }],
            "rejected": []
        }
    }))
}

async fn handle_stoptrack(State(mock): State<MockProvider>, Json(body): Json<Value>) -> Json<Value> {
    mock.calls.lock().unwrap().push(("stoptrack".to_string(), body.clone()));
    Json(json!({ "code": 0, "data": { "accepted": [{ "number": body[0]["number"] }], "rejected": [] } }))
}

async fn handle_gettrackinfo(
    State(mock): State<MockProvider>,
    Json(body): Json<Value>,
) -> Json<Value> {
    mock.calls.lock().unwrap().push(("gettrackinfo".to_string(), body.clone()));
    let number = body[0]["number"].as_str().unwrap_or_default().to_string();

    if number.starts_with("LEG") {
        // Legacy response generation
        return Json(json!({
            "data": [{
                "number": number,
                "track": {
                    "e": 40,
                    "z1": [
                        { "a": "2026-08-05 13:40", "c": "Salem, OR", "z": "Delivered, Front Porch" },
                        { "a": "2026-08-05 08:02", "c": "Salem, OR", "z": "Out for Delivery" }
                    ]
                }
            }]
        }));
    }

    Json(json!({
        "code": 0,
        "data": {
            "accepted": [{
                "number": number,
                "track_info": {
                    "latest_status": { "status": 35 },
                    "latest_event": { "description": "Out for Delivery", "location": "Eugene, OR" },
                    "estimated_delivery": "2026-08-09",
                    "events": [
                        { "description": "Out for Delivery", "location": "Eugene, OR", "time_iso": "2026-08-07T08:10:00" },
                        { "description": "Arrived at Facility", "location": "Eugene, OR", "time_iso": "2026-08-06T22:41:00" }
                    ]
                }
            }]
        }
    }))
}

async fn start_mock_provider() -> (MockProvider, String) {
    let mock = MockProvider::default();
    let router = Router::new()
        .route("/register", post(handle_register))
        .route("/stoptrack", post(handle_stoptrack))
        .route("/gettrackinfo", post(handle_gettrackinfo))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (mock, format!("http://{}", addr))
}

async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Should create in-memory database");
    solace_common::db::init::init_schema(&pool)
        .await
        .expect("Should initialize schema");
    pool
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_registration_sends_tag_and_contact_email() {
    let (mock, base_url) = start_mock_provider().await;
    let db = setup_test_db().await;
    let provider = ProviderClient::new(Some("test-key".to_string())).with_base_url(base_url);

    let patient = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO family_contacts (guid, patient_guid, name, email, is_primary) VALUES (?, ?, 'Sam Rivera', 'sam@example.com', 1)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(patient.to_string())
    .execute(&db)
    .await
    .unwrap();

    let mut delivery = new_delivery(patient, "Hospital bed".to_string());
    delivery.tracking_url = Some("https://www.ups.com/track?tracknum=1Z999AA10123456784".to_string());
    deliveries::insert_delivery(&db, &delivery).await.unwrap();

    let req = RegistrationRequest {
        tracking_url: delivery.tracking_url.clone(),
        ..Default::default()
    };
    let report = registration::register_delivery(&db, &provider, delivery.guid, &req).await;

    assert!(report.success);
    assert!(report.registered);
    assert_eq!(report.tracking_number.as_deref(), Some("1Z999AA10123456784"));
    assert_eq!(report.carrier.as_deref(), Some("UPS"));

    let registers = mock.calls_to("register");
    assert_eq!(registers.len(), 1);
    let item = &registers[0][0];
    assert_eq!(item["number"], "1Z999AA10123456784");
    assert_eq!(item["carrier"], 100002);
    assert_eq!(item["tag"], delivery.guid.to_string());
    assert_eq!(item["email"], "sam@example.com");

    // Detected fields backfilled onto the row
    let loaded = deliveries::load_delivery(&db, delivery.guid).await.unwrap().unwrap();
    assert_eq!(loaded.tracking_number.as_deref(), Some("1Z999AA10123456784"));
    assert_eq!(loaded.carrier.as_deref(), Some("UPS"));
}

#[tokio::test]
async fn test_already_registered_rejection_counts_as_success() {
    let (_mock, base_url) = start_mock_provider().await;
    let db = setup_test_db().await;
    let provider = ProviderClient::new(Some("test-key".to_string())).with_base_url(base_url);

    let mut delivery = new_delivery(Uuid::new_v4(), "Oxygen tanks".to_string());
    delivery.tracking_number = Some("DUP999000111222".to_string());
    deliveries::insert_delivery(&db, &delivery).await.unwrap();

    let report = registration::register_delivery(
        &db,
        &provider,
        delivery.guid,
        &RegistrationRequest::default(),
    )
    .await;

    assert!(report.success);
    assert!(report.registered);
    assert_eq!(report.message, "Tracking already registered");
}

#[tokio::test]
async fn test_other_rejection_is_soft_failure() {
    let (_mock, base_url) = start_mock_provider().await;
    let db = setup_test_db().await;
    let provider = ProviderClient::new(Some("test-key".to_string())).with_base_url(base_url);

    let mut delivery = new_delivery(Uuid::new_v4(), "Wound care kit".to_string());
    delivery.tracking_number = Some("REJ000111222333".to_string());
    deliveries::insert_delivery(&db, &delivery).await.unwrap();

    let report = registration::register_delivery(
        &db,
        &provider,
        delivery.guid,
        &RegistrationRequest::default(),
    )
    .await;

    assert!(!report.success);
    assert!(!report.registered);
    assert_eq!(report.message, "Invalid tracking number");
}

#[tokio::test]
async fn test_repointed_tracking_number_is_deregistered_first() {
    let (mock, base_url) = start_mock_provider().await;
    let db = setup_test_db().await;
    let provider = ProviderClient::new(Some("test-key".to_string())).with_base_url(base_url);

    let mut delivery = new_delivery(Uuid::new_v4(), "Lift chair".to_string());
    delivery.tracking_number = Some("1Z999AA10123456784".to_string());
    delivery.carrier = Some("UPS".to_string());
    deliveries::insert_delivery(&db, &delivery).await.unwrap();

    let app = build_router(AppState::new(db.clone(), provider, None));

    // Staff re-points the delivery at a different tracking number
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/api/deliveries/{}", delivery.guid))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "tracking_number": "9400111899223197428490", "carrier": "USPS" }).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Old subscription dropped, new number registered
    let stops = mock.calls_to("stoptrack");
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0][0]["number"], "1Z999AA10123456784");

    let registers = mock.calls_to("register");
    assert_eq!(registers.len(), 1);
    assert_eq!(registers[0][0]["number"], "9400111899223197428490");

    let loaded = deliveries::load_delivery(&db, delivery.guid).await.unwrap().unwrap();
    assert_eq!(loaded.tracking_number.as_deref(), Some("9400111899223197428490"));
}

#[tokio::test]
async fn test_batch_reregisters_each_active_delivery() {
    let (mock, base_url) = start_mock_provider().await;
    let db = setup_test_db().await;
    let provider = ProviderClient::new(Some("test-key".to_string())).with_base_url(base_url);

    for number in ["1Z999AA10123456784", "1Z999AA10123456785"] {
        let mut delivery = new_delivery(Uuid::new_v4(), "Supply shipment".to_string());
        delivery.tracking_url = Some(format!("https://www.ups.com/track?tracknum={}", number));
        deliveries::insert_delivery(&db, &delivery).await.unwrap();
    }

    let report = registration::reregister_active(&db, &provider).await;

    assert_eq!(report.attempted, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 0);
    assert!(report.failures.is_empty());
    assert_eq!(mock.calls_to("register").len(), 2);
}

// =============================================================================
// Refresh against live provider data
// =============================================================================

#[tokio::test]
async fn test_refresh_persists_provider_status() {
    let (_mock, base_url) = start_mock_provider().await;
    let db = setup_test_db().await;
    let provider = ProviderClient::new(Some("test-key".to_string())).with_base_url(base_url);

    let mut delivery = new_delivery(Uuid::new_v4(), "Shower chair".to_string());
    delivery.tracking_number = Some("1Z999AA10123456784".to_string());
    delivery.status = solace_common::DeliveryStatus::Shipped;
    deliveries::insert_delivery(&db, &delivery).await.unwrap();

    let response = refresh::refresh_delivery(&db, &provider, delivery.guid).await;

    assert!(response.success);
    assert!(response.error.is_none());
    assert_eq!(response.current_status, "Out for Delivery");
    assert_eq!(response.canonical_status, solace_common::DeliveryStatus::OutForDelivery);
    assert_eq!(response.estimated_delivery.as_deref(), Some("2026-08-09"));
    // Granular events, oldest first
    assert_eq!(response.events.len(), 2);
    assert_eq!(response.events[0].status, "Arrived at Facility");

    let loaded = deliveries::load_delivery(&db, delivery.guid).await.unwrap().unwrap();
    assert_eq!(loaded.status, solace_common::DeliveryStatus::OutForDelivery);
    assert_eq!(loaded.estimated_delivery.as_deref(), Some("2026-08-09"));
}

#[tokio::test]
async fn test_refresh_handles_legacy_response_shape() {
    let (_mock, base_url) = start_mock_provider().await;
    let db = setup_test_db().await;
    let provider = ProviderClient::new(Some("test-key".to_string())).with_base_url(base_url);

    let mut delivery = new_delivery(Uuid::new_v4(), "Bedside table".to_string());
    delivery.tracking_number = Some("LEG123456789012".to_string());
    delivery.status = solace_common::DeliveryStatus::InTransit;
    deliveries::insert_delivery(&db, &delivery).await.unwrap();

    let response = refresh::refresh_delivery(&db, &provider, delivery.guid).await;

    assert_eq!(response.canonical_status, solace_common::DeliveryStatus::Delivered);
    assert_eq!(response.current_status, "Delivered");

    let loaded = deliveries::load_delivery(&db, delivery.guid).await.unwrap().unwrap();
    assert_eq!(loaded.status, solace_common::DeliveryStatus::Delivered);
    assert!(loaded.delivered_at.is_some());
}
