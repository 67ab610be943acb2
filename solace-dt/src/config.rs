//! Tracking configuration resolution for solace-dt
//!
//! Provider credentials resolve through three tiers with
//! Database → ENV → TOML priority. Absence is not an error: a missing API
//! key puts the provider client into its degraded not-configured mode, and
//! a missing webhook secret disables signature verification.

use solace_common::config::TomlConfig;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Settings-table key for the provider API key
pub const API_KEY_SETTING: &str = "tracking_api_key";
/// Settings-table key for the webhook shared secret
pub const WEBHOOK_SECRET_SETTING: &str = "tracking_webhook_secret";

/// Environment variable for the provider API key
pub const API_KEY_ENV: &str = "SOLACE_TRACKING_API_KEY";
/// Environment variable for the webhook shared secret
pub const WEBHOOK_SECRET_ENV: &str = "SOLACE_TRACKING_WEBHOOK_SECRET";

/// Resolved tracking integration settings
#[derive(Debug, Clone, Default)]
pub struct TrackingSettings {
    pub api_key: Option<String>,
    pub webhook_secret: Option<String>,
}

/// Resolve tracking settings from Database → ENV → TOML
pub async fn resolve_tracking_settings(db: &SqlitePool, toml_config: &TomlConfig) -> TrackingSettings {
    let api_key = resolve_value(
        db,
        API_KEY_SETTING,
        API_KEY_ENV,
        toml_config.tracking_api_key.as_deref(),
        "tracking API key",
    )
    .await;

    let webhook_secret = resolve_value(
        db,
        WEBHOOK_SECRET_SETTING,
        WEBHOOK_SECRET_ENV,
        toml_config.tracking_webhook_secret.as_deref(),
        "webhook secret",
    )
    .await;

    if api_key.is_none() {
        info!("Tracking API key not configured; live tracking disabled (stored statuses still served)");
    }
    if webhook_secret.is_none() {
        info!("Webhook secret not configured; signature verification disabled");
    }

    TrackingSettings {
        api_key,
        webhook_secret,
    }
}

async fn resolve_value(
    db: &SqlitePool,
    setting_key: &str,
    env_var: &str,
    toml_value: Option<&str>,
    what: &str,
) -> Option<String> {
    let db_value = match crate::db::settings::get_setting(db, setting_key).await {
        Ok(v) => v.filter(|s| is_valid(s)),
        Err(e) => {
            warn!("Failed to read {} from database: {}", what, e);
            None
        }
    };
    let env_value = std::env::var(env_var).ok().filter(|s| is_valid(s));
    let toml_value = toml_value.filter(|s| is_valid(s)).map(str::to_string);

    let mut sources = Vec::new();
    if db_value.is_some() {
        sources.push("database");
    }
    if env_value.is_some() {
        sources.push("environment");
    }
    if toml_value.is_some() {
        sources.push("TOML");
    }
    if sources.len() > 1 {
        warn!(
            "{} found in multiple sources: {}. Using database (highest priority).",
            what,
            sources.join(", ")
        );
    }

    if let Some(value) = db_value {
        info!("{} loaded from database", what);
        return Some(value);
    }
    if let Some(value) = env_value {
        info!("{} loaded from environment variable", what);
        return Some(value);
    }
    if let Some(value) = toml_value {
        info!("{} loaded from TOML config", what);
        return Some(value);
    }
    None
}

/// Validate a configured value (non-empty, non-whitespace)
fn is_valid(value: &str) -> bool {
    !value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        solace_common::db::init::create_settings_table(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    #[serial]
    async fn test_absence_is_not_an_error() {
        let pool = test_pool().await;
        std::env::remove_var(API_KEY_ENV);
        std::env::remove_var(WEBHOOK_SECRET_ENV);

        let settings = resolve_tracking_settings(&pool, &TomlConfig::default()).await;
        assert!(settings.api_key.is_none());
        assert!(settings.webhook_secret.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn test_database_beats_env_and_toml() {
        let pool = test_pool().await;
        crate::db::settings::set_setting(&pool, API_KEY_SETTING, "db-key")
            .await
            .unwrap();
        std::env::set_var(API_KEY_ENV, "env-key");
        let toml_config = TomlConfig {
            tracking_api_key: Some("toml-key".to_string()),
            ..Default::default()
        };

        let settings = resolve_tracking_settings(&pool, &toml_config).await;
        assert_eq!(settings.api_key.as_deref(), Some("db-key"));

        std::env::remove_var(API_KEY_ENV);
    }

    #[tokio::test]
    #[serial]
    async fn test_env_beats_toml() {
        let pool = test_pool().await;
        std::env::set_var(API_KEY_ENV, "env-key");
        let toml_config = TomlConfig {
            tracking_api_key: Some("toml-key".to_string()),
            ..Default::default()
        };

        let settings = resolve_tracking_settings(&pool, &toml_config).await;
        assert_eq!(settings.api_key.as_deref(), Some("env-key"));

        std::env::remove_var(API_KEY_ENV);
    }

    #[tokio::test]
    #[serial]
    async fn test_blank_values_are_ignored() {
        let pool = test_pool().await;
        crate::db::settings::set_setting(&pool, API_KEY_SETTING, "   ")
            .await
            .unwrap();
        std::env::remove_var(API_KEY_ENV);

        let settings = resolve_tracking_settings(&pool, &TomlConfig::default()).await;
        assert!(settings.api_key.is_none());
    }
}
