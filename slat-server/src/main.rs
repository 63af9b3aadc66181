//! slat-server - Sentence Labeling & Assignment Tracker
//!
//! Admin uploads sentences via CSV and assigns index-ranged batches to
//! annotators; annotators label sentences assigned to them. State lives in
//! a single SQLite database.

use anyhow::Result;
use clap::Parser;
use slat_common::auth::load_api_secret;
use slat_common::config::BootstrapConfig;
use slat_common::db::init_database;
use slat_server::config::{Args, ServerConfig};
use slat_server::{build_router, AppState};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let bootstrap = BootstrapConfig::load()?;
    let config = ServerConfig::resolve(&args, &bootstrap);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting SLAT server (slat-server) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    info!("Database path: {}", config.database_path.display());
    let pool = init_database(&config.database_path).await?;

    let jwt_secret = load_api_secret(&pool).await?;
    if jwt_secret.is_empty() {
        warn!("API authentication DISABLED (api_jwt_secret is empty)");
        warn!("Set the 'api_jwt_secret' setting to enable bearer-token auth");
    } else {
        info!("✓ Loaded API signing secret, bearer-token auth enabled");
    }

    let state = AppState::new(pool, jwt_secret);
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("slat-server listening on http://{}", addr);
    info!("Health check: http://127.0.0.1:{}/health", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
