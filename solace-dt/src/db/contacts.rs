//! Family contact lookup
//!
//! Only one query lives here: the notification email passed through to the
//! tracking provider at registration time. Contact management itself
//! belongs to the portal, not this service.

use anyhow::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Email of the patient's primary family contact (falls back to any contact
/// with an email when no primary is marked)
pub async fn primary_contact_email(pool: &SqlitePool, patient_guid: Uuid) -> Result<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT email FROM family_contacts
        WHERE patient_guid = ? AND email IS NOT NULL AND email <> ''
        ORDER BY is_primary DESC, name
        LIMIT 1
        "#,
    )
    .bind(patient_guid.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(email,)| email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_primary_contact_preferred() {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        solace_common::db::init::create_family_contacts_table(&pool).await.unwrap();

        let patient = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO family_contacts (guid, patient_guid, name, email, is_primary) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(patient.to_string())
        .bind("Alex Rivera")
        .bind("alex@example.com")
        .bind(0)
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO family_contacts (guid, patient_guid, name, email, is_primary) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(patient.to_string())
        .bind("Sam Rivera")
        .bind("sam@example.com")
        .bind(1)
        .execute(&pool)
        .await
        .unwrap();

        let email = primary_contact_email(&pool, patient).await.unwrap();
        assert_eq!(email.as_deref(), Some("sam@example.com"));
    }

    #[tokio::test]
    async fn test_no_contacts_returns_none() {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        solace_common::db::init::create_family_contacts_table(&pool).await.unwrap();

        let email = primary_contact_email(&pool, Uuid::new_v4()).await.unwrap();
        assert!(email.is_none());
    }
}
