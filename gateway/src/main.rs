use anyhow::Result;
use axum::{
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod job;
mod pipeline;
mod routes;

use config::GatewayConfig;
use job::JobController;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<JobController>,
    pub config: GatewayConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "screening_gateway=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env();
    std::fs::create_dir_all(&config.data_dir)?;

    let controller = JobController::new(config.clone());
    let state = AppState {
        controller,
        config: config.clone(),
    };

    // API routes for screening job control
    let screening_routes = Router::new()
        .route("/screening/start", post(routes::start_job))
        .route("/screening/stop", post(routes::stop_job))
        .route("/screening/status", get(routes::get_status))
        .route("/screening/results", get(routes::get_results))
        .route(
            "/satellites",
            get(routes::list_satellites).post(routes::upload_satellite),
        )
        .with_state(state);

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", screening_routes)
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);

    tracing::info!("🛰️  Screening gateway starting on {}", addr);
    tracing::info!("   Data directory: {}", config.data_dir.display());
    tracing::info!("   Risk model: {}", config.model_path.display());
    tracing::info!(
        "   Window: {}h, coarse {}s, fine {}s, threshold {} km",
        config.window_hours,
        config.coarse_step_secs,
        config.fine_step_secs,
        config.threshold_km
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "screening-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
