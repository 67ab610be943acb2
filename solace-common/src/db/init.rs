//! Schema initialization for the shared solace.db
//!
//! All tables are created with `CREATE TABLE IF NOT EXISTS` so services can
//! start in any order against the same database file.

use crate::Result;
use sqlx::SqlitePool;

/// Create every table the delivery-tracking service relies on
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_settings_table(pool).await?;
    create_deliveries_table(pool).await?;
    create_family_contacts_table(pool).await?;

    tracing::info!("Database tables initialized (settings, deliveries, family_contacts)");

    Ok(())
}

/// Create settings table for key/value configuration persistence
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create deliveries table
///
/// `tracking_number` is indexed because inbound webhooks look deliveries up
/// by exact tracking-number match.
pub async fn create_deliveries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS deliveries (
            guid TEXT PRIMARY KEY,
            patient_guid TEXT NOT NULL,
            description TEXT NOT NULL,
            carrier TEXT,
            tracking_number TEXT,
            tracking_url TEXT,
            status TEXT NOT NULL DEFAULT 'ordered',
            estimated_delivery TEXT,
            notes TEXT,
            delivered_at TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_deliveries_tracking_number ON deliveries(tracking_number)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_deliveries_patient ON deliveries(patient_guid)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create family_contacts table
pub async fn create_family_contacts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS family_contacts (
            guid TEXT PRIMARY KEY,
            patient_guid TEXT NOT NULL,
            name TEXT NOT NULL,
            email TEXT,
            is_primary INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_family_contacts_patient ON family_contacts(patient_guid)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
