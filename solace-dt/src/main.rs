//! solace-dt (Delivery Tracking) - Package tracking microservice
//!
//! Owns the delivery store and all traffic to/from the external
//! multi-carrier tracking provider: registration, webhook reconciliation,
//! and on-demand refresh. Family/admin UI reads go through the stored
//! delivery rows; no request on that path touches the provider.

use anyhow::Result;
use clap::Parser;
use solace_dt::provider::client::ProviderClient;
use solace_dt::{build_router, AppState};
use tracing::info;

/// Service port
const PORT: u16 = 5741;

#[derive(Parser, Debug)]
#[command(name = "solace-dt", about = "Solace delivery tracking service")]
struct Args {
    /// Data folder holding solace.db (overrides env and TOML config)
    #[arg(long)]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting Solace Delivery Tracking (solace-dt) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    // Resolve data folder: CLI -> env -> TOML -> OS default
    let data_folder =
        solace_common::config::resolve_data_folder(args.data_dir.as_deref(), "SOLACE_DATA_DIR");
    let db_path = solace_common::config::prepare_data_folder(&data_folder)?;
    info!("Database: {}", db_path.display());

    let pool = solace_dt::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    // TOML config is the lowest resolution tier; absence is fine
    let toml_config = solace_common::config::load_toml_config().unwrap_or_default();
    let tracking = solace_dt::config::resolve_tracking_settings(&pool, &toml_config).await;

    let provider = ProviderClient::new(tracking.api_key);
    if provider.is_configured() {
        info!("✓ Tracking provider configured (live tracking enabled)");
    } else {
        info!("Tracking provider not configured (serving stored statuses only)");
    }

    let state = AppState::new(pool, provider, tracking.webhook_secret);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", PORT)).await?;
    info!("solace-dt listening on http://0.0.0.0:{}", PORT);
    info!("Health check: http://127.0.0.1:{}/health", PORT);
    info!("Webhook endpoint: http://0.0.0.0:{}/api/tracking/webhook", PORT);

    axum::serve(listener, app).await?;

    Ok(())
}
