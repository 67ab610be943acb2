//! Delivery store operations
//!
//! Status writes go through [`set_status_if_changed`], a single conditional
//! UPDATE: two near-simultaneous webhook deliveries for the same tracking
//! number cannot both observe "differs from current" and double-write.

use anyhow::Result;
use chrono::Utc;
use solace_common::db::models::Delivery;
use solace_common::DeliveryStatus;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Fields a staff edit may change on a delivery; `None` leaves the stored
/// value untouched.
#[derive(Debug, Clone, Default)]
pub struct DeliveryUpdate {
    pub description: Option<String>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub status: Option<DeliveryStatus>,
    pub estimated_delivery: Option<String>,
    pub notes: Option<String>,
}

/// Insert a new delivery record
pub async fn insert_delivery(pool: &SqlitePool, delivery: &Delivery) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO deliveries
            (guid, patient_guid, description, carrier, tracking_number, tracking_url,
             status, estimated_delivery, notes, delivered_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(delivery.guid.to_string())
    .bind(delivery.patient_guid.to_string())
    .bind(&delivery.description)
    .bind(&delivery.carrier)
    .bind(&delivery.tracking_number)
    .bind(&delivery.tracking_url)
    .bind(delivery.status.as_str())
    .bind(&delivery.estimated_delivery)
    .bind(&delivery.notes)
    .bind(&delivery.delivered_at)
    .bind(&delivery.created_at)
    .bind(&delivery.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a delivery by id
pub async fn load_delivery(pool: &SqlitePool, guid: Uuid) -> Result<Option<Delivery>> {
    let row = sqlx::query("SELECT * FROM deliveries WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(row_to_delivery).transpose()
}

/// Load a delivery by exact tracking-number match (webhook lookup path)
pub async fn load_by_tracking_number(
    pool: &SqlitePool,
    tracking_number: &str,
) -> Result<Option<Delivery>> {
    let row = sqlx::query("SELECT * FROM deliveries WHERE tracking_number = ? LIMIT 1")
        .bind(tracking_number)
        .fetch_optional(pool)
        .await?;

    row.map(row_to_delivery).transpose()
}

/// List deliveries, optionally filtered by patient
pub async fn list_deliveries(pool: &SqlitePool, patient: Option<Uuid>) -> Result<Vec<Delivery>> {
    let rows = match patient {
        Some(patient_guid) => {
            sqlx::query("SELECT * FROM deliveries WHERE patient_guid = ? ORDER BY created_at DESC")
                .bind(patient_guid.to_string())
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query("SELECT * FROM deliveries ORDER BY created_at DESC")
                .fetch_all(pool)
                .await?
        }
    };

    rows.into_iter().map(row_to_delivery).collect()
}

/// Deliveries with a stored tracking URL that have not yet been delivered
/// (batch re-registration candidates)
pub async fn list_active_with_tracking_url(pool: &SqlitePool) -> Result<Vec<Delivery>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM deliveries
        WHERE tracking_url IS NOT NULL AND tracking_url <> '' AND status <> 'delivered'
        ORDER BY created_at
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_delivery).collect()
}

/// Apply a staff edit. Returns false when the delivery does not exist.
pub async fn update_delivery(
    pool: &SqlitePool,
    guid: Uuid,
    update: &DeliveryUpdate,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE deliveries SET
            description = COALESCE(?, description),
            carrier = COALESCE(?, carrier),
            tracking_number = COALESCE(?, tracking_number),
            tracking_url = COALESCE(?, tracking_url),
            status = COALESCE(?, status),
            estimated_delivery = COALESCE(?, estimated_delivery),
            notes = COALESCE(?, notes),
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(&update.description)
    .bind(&update.carrier)
    .bind(&update.tracking_number)
    .bind(&update.tracking_url)
    .bind(update.status.map(|s| s.as_str()))
    .bind(&update.estimated_delivery)
    .bind(&update.notes)
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    // delivered_at is stamped exactly when status becomes delivered
    if update.status == Some(DeliveryStatus::Delivered) {
        sqlx::query(
            "UPDATE deliveries SET delivered_at = ? WHERE guid = ? AND delivered_at IS NULL",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(guid.to_string())
        .execute(pool)
        .await?;
    }

    Ok(result.rows_affected() > 0)
}

/// Conditionally move a delivery to a new status.
///
/// Single atomic UPDATE guarded by `status <> ?`; returns true only when a
/// row actually changed. Transitioning to delivered stamps `delivered_at`.
pub async fn set_status_if_changed(
    pool: &SqlitePool,
    guid: Uuid,
    new_status: DeliveryStatus,
) -> Result<bool> {
    let delivered_at = if new_status == DeliveryStatus::Delivered {
        Some(Utc::now().to_rfc3339())
    } else {
        None
    };

    let result = sqlx::query(
        r#"
        UPDATE deliveries
        SET status = ?,
            delivered_at = COALESCE(?, delivered_at),
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ? AND status <> ?
        "#,
    )
    .bind(new_status.as_str())
    .bind(delivered_at)
    .bind(guid.to_string())
    .bind(new_status.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Backfill tracking fields discovered by carrier detection. `None` values
/// leave the stored fields untouched.
pub async fn update_tracking_fields(
    pool: &SqlitePool,
    guid: Uuid,
    tracking_number: Option<&str>,
    carrier: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE deliveries SET
            tracking_number = COALESCE(?, tracking_number),
            carrier = COALESCE(?, carrier),
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(tracking_number)
    .bind(carrier)
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a delivery (explicit staff action only)
pub async fn delete_delivery(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM deliveries WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn row_to_delivery(row: sqlx::sqlite::SqliteRow) -> Result<Delivery> {
    let guid_str: String = row.get("guid");
    let patient_str: String = row.get("patient_guid");
    let status_str: String = row.get("status");

    Ok(Delivery {
        guid: Uuid::parse_str(&guid_str)?,
        patient_guid: Uuid::parse_str(&patient_str)?,
        description: row.get("description"),
        carrier: row.get("carrier"),
        tracking_number: row.get("tracking_number"),
        tracking_url: row.get("tracking_url"),
        status: DeliveryStatus::parse_lossy(&status_str),
        estimated_delivery: row.get("estimated_delivery"),
        notes: row.get("notes"),
        delivered_at: row.get("delivered_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Build a new delivery record with freshly stamped timestamps
pub fn new_delivery(patient_guid: Uuid, description: String) -> Delivery {
    let now = Utc::now().to_rfc3339();
    Delivery {
        guid: Uuid::new_v4(),
        patient_guid,
        description,
        carrier: None,
        tracking_number: None,
        tracking_url: None,
        status: DeliveryStatus::Ordered,
        estimated_delivery: None,
        notes: None,
        delivered_at: None,
        created_at: now.clone(),
        updated_at: now,
    }
}
