use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use syncbridge::app_state::AppState;
use syncbridge::config::AppConfig;
use syncbridge::routes;
use syncbridge::services::{engine::TranscriptionEngine, session::SessionStore};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing syncbridge server");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);
    routes::metrics::describe();

    tracing::info!(path = %config.session_path, "Loading session");
    let session = SessionStore::load_or_empty(&config.session_path).await;

    let settings = config.engine_settings();
    tracing::info!(
        tick_interval_ms = config.tick_interval_ms,
        progress_ceiling = config.progress_ceiling,
        image_processing_ms = config.image_processing_ms,
        audio_processing_ms = config.audio_processing_ms,
        "Starting simulated transcription engine"
    );
    let engine = TranscriptionEngine::simulated(settings, config.backend());

    let state = AppState::new(engine, session);

    let app = routes::router(state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
