//! Settings table access

use anyhow::Result;
use sqlx::SqlitePool;

/// Read a setting value by key
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(value.map(|(v,)| v))
}

/// Write a setting value (insert or replace)
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set_round_trip() {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        solace_common::db::init::create_settings_table(&pool).await.unwrap();

        assert_eq!(get_setting(&pool, "tracking_api_key").await.unwrap(), None);

        set_setting(&pool, "tracking_api_key", "key-abc").await.unwrap();
        assert_eq!(
            get_setting(&pool, "tracking_api_key").await.unwrap().as_deref(),
            Some("key-abc")
        );

        set_setting(&pool, "tracking_api_key", "key-def").await.unwrap();
        assert_eq!(
            get_setting(&pool, "tracking_api_key").await.unwrap().as_deref(),
            Some("key-def")
        );
    }
}
