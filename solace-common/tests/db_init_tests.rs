//! Integration tests for database schema initialization
//!
//! Covers automatic table creation, re-initialization of an existing
//! database, and the tracking-number index used by webhook lookups.

use solace_common::db::init;
use sqlx::SqlitePool;

async fn memory_pool() -> SqlitePool {
    SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database")
}

#[tokio::test]
async fn test_init_schema_creates_all_tables() {
    let pool = memory_pool().await;

    init::init_schema(&pool).await.expect("Schema init failed");

    for table in ["settings", "deliveries", "family_contacts"] {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1, "Table {} was not created", table);
    }
}

#[tokio::test]
async fn test_init_schema_is_idempotent() {
    let pool = memory_pool().await;

    init::init_schema(&pool).await.expect("First init failed");
    init::init_schema(&pool).await.expect("Second init failed");
}

#[tokio::test]
async fn test_tracking_number_index_exists() {
    let pool = memory_pool().await;

    init::init_schema(&pool).await.unwrap();

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_deliveries_tracking_number'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1, "tracking_number index missing");
}

#[tokio::test]
async fn test_delivery_status_defaults_to_ordered() {
    let pool = memory_pool().await;

    init::init_schema(&pool).await.unwrap();

    sqlx::query(
        "INSERT INTO deliveries (guid, patient_guid, description) VALUES ('d-1', 'p-1', 'Oxygen concentrator')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let status: String = sqlx::query_scalar("SELECT status FROM deliveries WHERE guid = 'd-1'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "ordered");
}
