use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;
use crate::services::engine::EngineStats;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub engine: EngineStats,
    pub session: SessionHealth,
}

#[derive(Serialize)]
pub struct SessionHealth {
    pub authenticated: bool,
}

/// GET /health: liveness plus engine job counts.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            engine: state.engine.stats(),
            session: SessionHealth {
                authenticated: state.session.is_authenticated().await,
            },
        },
    })
}
